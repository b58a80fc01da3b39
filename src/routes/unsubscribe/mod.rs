mod confirm;
mod get;
mod post;

pub use confirm::confirm_unsubscribe;
pub use get::unsubscribe_form;
pub use post::request_unsubscribe;
