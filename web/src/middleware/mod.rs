pub(crate) mod media_type;
