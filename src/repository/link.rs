use crate::repository::{FileRepository, LinkReader, LinkWriter, RepositoryResult};

impl LinkReader for FileRepository {
    fn list_links(&self) -> RepositoryResult<Vec<String>> {
        Self::read_json(&self.links_path)
    }
}

impl LinkWriter for FileRepository {
    fn save_links(&self, links: &[String]) -> RepositoryResult<usize> {
        // Sorted output keeps crawl artifacts diffable between runs
        let mut sorted = links.to_vec();
        sorted.sort();
        sorted.dedup();

        Self::write_json(&self.links_path, &sorted)?;
        Ok(sorted.len())
    }
}
