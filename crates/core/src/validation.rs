use crate::domain::applicant::{ApplicantField, ApplicantFields};
use crate::selection::SelectionState;

/// Categories whose offering is booked for a specific slot.
pub const SCHEDULED_CATEGORY_IDS: [&str; 2] = ["trial", "placement"];

pub fn needs_schedule(selection: &SelectionState) -> bool {
    let scheduled_category = selection
        .current_category()
        .map(|category| SCHEDULED_CATEGORY_IDS.contains(&category.id.as_str()))
        .unwrap_or(false);
    let single_lesson =
        selection.current_bundle().map(|bundle| bundle.unit_count == 1).unwrap_or(false);

    scheduled_category || single_lesson
}

/// Fields that still block submission, in form order. Only presence is
/// checked; shape validation happens downstream of intake.
pub fn missing_fields(fields: &ApplicantFields, selection: &SelectionState) -> Vec<ApplicantField> {
    let schedule: &[ApplicantField] =
        if needs_schedule(selection) { &ApplicantField::SCHEDULE } else { &[] };

    ApplicantField::CONTACT
        .iter()
        .chain(schedule)
        .copied()
        .filter(|field| fields.is_blank(*field))
        .collect()
}

pub fn is_ready_to_submit(fields: &ApplicantFields, selection: &SelectionState) -> bool {
    missing_fields(fields, selection).is_empty()
}
