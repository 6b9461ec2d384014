use crate::store::{Store, StoreError};
use crate::types::RecordSample;

pub const PAGE_SIZE: usize = 500;

/// Newest-first history for one entity, following the store's continuation
/// cursor until `max_records` is reached (`None` fetches the full history)
/// or the store runs out of pages.
pub async fn fetch_history(
    store: &Store,
    entity: &str,
    max_records: Option<usize>,
    page_size: usize,
) -> Result<Vec<RecordSample>, StoreError> {
    if max_records == Some(0) {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut cursor = None;
    loop {
        let page_limit = match max_records {
            Some(cap) => page_size.min(cap - out.len()),
            None => page_size,
        };
        let page = store.query_page(entity, page_limit, cursor.take()).await?;
        out.extend(page.samples);
        let done = match (&page.next, max_records) {
            (None, _) => true,
            (_, Some(cap)) => out.len() >= cap,
            _ => false,
        };
        if done {
            break;
        }
        cursor = page.next;
    }
    if let Some(cap) = max_records {
        out.truncate(cap);
    }
    Ok(out)
}
