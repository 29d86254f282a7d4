//! Table repositories.

mod credit_repo;
mod video_repo;

pub use credit_repo::CreditRepo;
pub use video_repo::VideoRepo;
