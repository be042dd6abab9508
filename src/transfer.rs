use crate::data::Adjustment;
use crate::error::DeskError;
use chrono::NaiveDate;
use serde_json::Value;

/// Parses an exported adjustment list for `date`. Anything other than an
/// array of adjustment records dated `date` is rejected whole.
pub fn import_adjustments(raw: Value, date: NaiveDate) -> Result<Vec<Adjustment>, DeskError> {
    if !raw.is_array() {
        return Err(DeskError::InvalidImportFormat(
            "expected an array of adjustments".to_string(),
        ));
    }
    let adjustments: Vec<Adjustment> =
        serde_json::from_value(raw).map_err(|e| DeskError::InvalidImportFormat(e.to_string()))?;
    if let Some(stray) = adjustments.iter().find(|a| a.date != date) {
        return Err(DeskError::InvalidImportFormat(format!(
            "adjustment {} is dated {}, expected {}",
            stray.id, stray.date, date
        )));
    }
    Ok(adjustments)
}

pub fn export_adjustments(adjustments: &[Adjustment]) -> Result<Value, DeskError> {
    serde_json::to_value(adjustments).map_err(|e| DeskError::Serialization(e.to_string()))
}
