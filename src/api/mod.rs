pub(crate) mod achievements;
pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod media;
pub(crate) mod pagination;
pub(crate) mod public;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
