use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpanderError {
    #[error(transparent)]
    PartRepo(#[from] part_repo::PartRepoError),
}
