//! 实时更新推送

mod broadcast_notifier;

pub use broadcast_notifier::BroadcastNotifier;
