// Bio classification: keyword prefilter, batched review call, and the
// operator-editable criteria that parameterize the review.

pub mod classifier;
pub mod handlers;
pub mod matcher;
pub mod prompts;
pub mod reply;
pub mod store;
