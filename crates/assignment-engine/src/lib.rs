pub mod classify;
pub mod dates;
pub mod error;
pub mod html;
pub mod links;
pub mod markdown;
pub mod model;
pub mod search;
pub mod source;
pub mod text;
