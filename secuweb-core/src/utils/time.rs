use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Restituisce l'istante corrente in UTC formattato come RFC3339 (es. "2025-11-02T12:34:56.789Z").
pub fn now_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Formatta un istante come RFC3339 UTC con precisione al millisecondo.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    // troncamento ai millisecondi, come i datetime del document store
    let at = at
        .replace_millisecond(at.millisecond())
        .unwrap_or(at);
    at.format(&Rfc3339).unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Converte millisecondi dall'epoch Unix in RFC3339.
pub fn timestamp_from_millis(millis: i64) -> String {
    let nanos = i128::from(millis) * 1_000_000;
    match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
        Ok(at) => format_timestamp(at),
        Err(_) => millis.to_string(),
    }
}
