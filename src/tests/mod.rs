mod alias_delete;
mod alias_quota;
mod alias_use;
mod invalid_json;
mod status;
