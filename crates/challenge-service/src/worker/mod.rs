pub mod announcement_delivery_worker;
pub mod heartbeat_worker;

pub use announcement_delivery_worker::AnnouncementDeliveryWorker;
pub use heartbeat_worker::HeartbeatWorker;
