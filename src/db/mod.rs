pub mod metadata_repo;
