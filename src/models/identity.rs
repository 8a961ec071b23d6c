/// Index identity of the view of `uuid` in `locale`.
///
/// Every write and delete is keyed by this value; it is never stored apart
/// from the document.
pub fn view_document_id(uuid: &str, locale: &str) -> String {
    format!("{uuid}-{locale}")
}

/// Identities for several uuids in one locale, in input order.
pub fn view_document_ids<S: AsRef<str>>(uuids: &[S], locale: &str) -> Vec<String> {
    uuids
        .iter()
        .map(|uuid| view_document_id(uuid.as_ref(), locale))
        .collect()
}
