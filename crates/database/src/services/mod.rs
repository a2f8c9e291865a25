pub mod course;
pub mod dashboard;
pub mod department;
pub mod enrollment;
pub mod error;
pub mod student;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use serde::Serialize;

/// Case-insensitive substring match on a column
pub(crate) fn icontains(column: impl IntoColumnRef, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

/// One page of results plus the numbers a pager needs
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served
    pub page: u64,
    pub per_page: u64,
    /// At least 1, even when there are no items
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// `page` must already be clamped with [`clamp_page`]
    pub(crate) fn new(items: Vec<T>, page: u64, per_page: u64, total_items: u64) -> Self {
        let total_pages = total_pages(total_items, per_page);
        Self {
            items,
            page,
            per_page,
            total_pages,
            total_items,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

fn total_pages(total_items: u64, per_page: u64) -> u64 {
    total_items.div_ceil(per_page).max(1)
}

/// Clamps a requested 1-based page number into `1..=total_pages`
pub(crate) fn clamp_page(requested: u64, total_items: u64, per_page: u64) -> u64 {
    requested.clamp(1, total_pages(total_items, per_page))
}
