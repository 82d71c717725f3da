//! Read-only administrative views over devices and the request log.
//!
//! Only `GET` routes are registered; the router answers any other method
//! with `405 Method Not Allowed`.

pub mod devices;
pub mod requests;

use serde::Deserialize;

use uadtrack_core::store::{PageRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    pub fn validate(&self) -> Result<PageRequest, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(PageRequest {
            limit,
            offset: self.offset.unwrap_or(0),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
