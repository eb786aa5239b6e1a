pub mod assessment;
pub mod corpus;
