pub mod bridge;
pub mod cryo;
pub mod mess;
