use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Whole minutes between two instants, truncated toward zero.
pub(crate) fn elapsed_minutes(from: PrimitiveDateTime, to: PrimitiveDateTime) -> i64 {
    (to.assume_utc() - from.assume_utc()).whole_minutes()
}
