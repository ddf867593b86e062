pub mod dispatch;
pub mod launch;
pub mod versions;
