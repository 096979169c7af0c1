pub mod category;
pub mod content;
pub mod profile;
pub mod site;
pub mod slug;
pub mod types;
