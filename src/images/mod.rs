mod services;

pub use services::{ext_from_mime, ImageStore, LocalImageStore};
