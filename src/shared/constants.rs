/// Shown in place of a checkpoint date that has not been announced
pub const DATE_TBD: &str = "Date TBD";

/// Default table holding checkpoint rows
pub const CHECKPOINTS_TABLE: &str = "checkpoints";

// =============================================================================
// POSTGREST PROTOCOL
// =============================================================================

/// Accept header asking PostgREST for exactly one row as a bare object
pub const PGRST_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// PostgREST error code for "JSON object requested, multiple (or no) rows returned"
pub const PGRST_NO_ROWS_CODE: &str = "PGRST116";

/// Column list requested on every read
pub const CHECKPOINT_COLUMNS: &str = "id, date, state, city, county, location, time, notes, latitude, longitude, created_at, updated_at";
