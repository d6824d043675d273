/*
User-facing message table.

Every alert the volunteer and admin screens show comes from here, so wording
stays identical across endpoints.

Usage:
    use crate::i18n;
    let msg = i18n::t("validation.missing_fields");
    let warn = i18n::t_with("scheduler.under_filled", &[("time", "9am-5pm")]);

Notes:
- Placeholders use single-brace format: `{name}`.
- Only English ships today. A missing key for a requested language falls back
  to the default language, then to the key itself.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "validation.missing_fields": "Please fill in all the fields!",
  "validation.volunteers_needed": "Number of volunteers needed must be a whole number.",
  "validation.missing_name": "Please enter your full name.",
  "validation.privacy_required": "You must agree to the privacy policy.",
  "validation.no_shifts_selected": "Please select at least one shift to drop.",
  "validation.no_availability": "Please select at least one time slot.",
  "validation.shift_not_held": "You can only drop shifts you are scheduled for.",
  "validation.not_on_roster": "{name} is not on this shift's roster.",
  "signup.already_registered": "You're already signed up for this event. Use \"Already checked in\" instead.",
  "scheduler.under_filled": "Less than 50% of volunteers were assigned for shift at {time}",
  "scheduler.failed": "Something went wrong while scheduling shifts.",
  "scheduler.manual_mode": "This event uses manual scheduling. Turn it off to run the scheduler.",
  "scheduler.write_conflict": "The shift roster kept changing while it was being updated. Please try again.",
  "claim.success": "You've claimed this shift.",
  "claim.already_claimed": "You're already on this shift.",
  "claim.full": "This shift is full. You can join the waitlist instead.",
  "claim.auto_scheduled": "Shifts for this event are assigned by the scheduler.",
  "waitlist.joined": "You've been added to the waitlist.",
  "waitlist.already_joined": "You're already on the waitlist for this shift.",
  "waitlist.shift_open": "This shift still has room. Claim it instead.",
  "availability.submitted": "Availability submitted.",
  "shift.created": "Shift created!",
  "team_lead.assigned": "{name} assigned as Team Lead.",
  "checkin.not_found": "We couldn't find a check-in for you today. Please check in at the volunteer desk.",
  "checkin.recorded": "You're checked in.",
  "help.sent": "A team lead has been notified.{floor}\nPlease stay where you are.",
  "change_request.submitted": "Request submitted successfully!",
  "change_request.locked": "Your schedule is locked. Please talk to a team lead.",
  "admin.invalid_code": "That admin code is not valid for this event.",
  "not_found.event": "Event not found",
  "not_found.shift": "Shift not found",
  "not_found.volunteer": "Volunteer not found",
  "not_found.help_request": "Help request not found",
  "error.generic": "Something went wrong.",
  "app.name": "CrewHQ"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Translate a key using an explicit language (or default if None).
///
/// Returns the translated and parameter-substituted string. If no translation is found,
/// returns the default language value or the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        // If still missing, return the key itself (useful in logs)
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}

/// Convenience wrapper with params (default language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}
