mod activity_event;
mod subscriber_email;
mod verification_code;

pub use activity_event::ActivityEvent;
pub use subscriber_email::SubscriberEmail;
pub use verification_code::VerificationCode;
