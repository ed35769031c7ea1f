pub mod blobs;
pub mod metadata;
pub mod models;

pub use blobs::{BlobStore, FileBlobStore, FileMirrorFactory, MirrorStoreFactory};
pub use metadata::{FileMetadataStore, MetadataStore};
pub use models::{SubWalletInfo, WalletInfo};
