//! Grouping of pages into series.
//!
//! A series is a run of consecutive pages that can be stacked: same shape,
//! same dtype, and the same full/reduced-resolution role. A multi-page
//! z-stack is one series; a pyramid or a file mixing a large image with a
//! thumbnail yields several.

use crate::stack::{Page, Series};

use super::page::PageLayout;

/// Split pages into series of consecutive compatible pages.
pub fn group_series(pages: &[PageLayout]) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    let mut previous: Option<&PageLayout> = None;

    for page in pages {
        let page_entry = Page {
            index: page.index,
            shape: page.shape(),
        };

        match (previous, series.last_mut()) {
            (Some(prev), Some(current)) if compatible(prev, page) => {
                current.pages.push(page_entry);
            }
            _ => series.push(Series {
                dtype: page.dtype,
                pages: vec![page_entry],
            }),
        }
        previous = Some(page);
    }

    series
}

fn compatible(a: &PageLayout, b: &PageLayout) -> bool {
    a.dtype == b.dtype
        && a.shape() == b.shape()
        && a.is_reduced_resolution() == b.is_reduced_resolution()
}
