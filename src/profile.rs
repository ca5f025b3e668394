//! User profile stored in the app data root.

use chrono::{Datelike, NaiveDate};

use crate::data::{load_data, new_id, update_data};
use crate::db::DatabaseError;
use crate::models::{Profile, ProfilePatch, Specialist, SpecialistType, SwabScores, SwabVisit};
use crate::store::KeyValueStore;

pub fn get_profile(store: &dyn KeyValueStore) -> Result<Profile, DatabaseError> {
    Ok(load_data(store)?.profile)
}

/// Apply `patch` to `profile`.
///
/// Scalars are replaced when set. Swab scores merge per zone and are
/// only touched when the patch carries scores. Features merge by field.
/// Lists are replaced wholesale when given.
pub fn merge_profile(profile: &mut Profile, patch: ProfilePatch) {
    if let Some(v) = patch.name {
        profile.name = Some(v);
    }
    if let Some(v) = patch.first_name {
        profile.first_name = Some(v);
    }
    if let Some(v) = patch.last_name {
        profile.last_name = Some(v);
    }
    if let Some(v) = patch.date_of_birth {
        profile.date_of_birth = Some(v);
    }
    if let Some(v) = patch.age {
        profile.age = Some(v);
    }
    if let Some(v) = patch.diagnosis_date {
        profile.diagnosis_date = Some(v);
    }
    if let Some(swab) = patch.swab_test {
        if let Some(result) = swab.result {
            profile.swab_test.result = result;
        }
        if let Some(note) = swab.note {
            profile.swab_test.note = Some(note);
        }
        if let Some(scores) = swab.scores {
            let base = profile.swab_test.scores.clone().unwrap_or_default();
            profile.swab_test.scores = Some(base.merged_with(&scores));
        }
    }
    if let Some(features) = patch.features {
        if let Some(v) = features.voiding_diary_enabled {
            profile.features.voiding_diary_enabled = v;
        }
    }
    if let Some(v) = patch.specialists {
        profile.specialists = v.into();
    }
    if let Some(v) = patch.swab_visits {
        profile.swab_visits = v.into();
    }
    if let Some(v) = patch.current_therapies {
        profile.current_therapies = v.into();
    }
    if let Some(v) = patch.support_removed {
        profile.support_removed = v;
    }
}

pub fn update_profile(
    store: &dyn KeyValueStore,
    patch: ProfilePatch,
) -> Result<Profile, DatabaseError> {
    let data = update_data(store, |data| merge_profile(&mut data.profile, patch))?;
    tracing::info!("Profile updated");
    Ok(data.profile)
}

/// First and last name, falling back to the legacy single name.
pub fn display_name(profile: &Profile) -> Option<String> {
    let parts: Vec<&str> = [profile.first_name.as_deref(), profile.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !parts.is_empty() {
        return Some(parts.join(" "));
    }
    profile
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Age on `on`: from the date of birth when known, otherwise the
/// stored age.
pub fn age_on(profile: &Profile, on: NaiveDate) -> Option<u32> {
    let Some(born) = profile.date_of_birth else {
        return profile.age;
    };
    let mut years = on.year() - born.year();
    if (on.month(), on.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

// ═══════════════════════════════════════════
// Swab visits
// ═══════════════════════════════════════════

pub fn add_swab_visit(
    store: &dyn KeyValueStore,
    date: NaiveDate,
    scores: SwabScores,
) -> Result<SwabVisit, DatabaseError> {
    let visit = SwabVisit {
        id: new_id(),
        date,
        swab_scores: scores,
    };
    update_data(store, |data| {
        data.profile.swab_visits.push(visit.clone());
        data.profile.swab_visits.sort_by_key(|v| v.date);
    })?;
    tracing::info!(visit_id = %visit.id, "Swab visit added");
    Ok(visit)
}

pub fn remove_swab_visit(store: &dyn KeyValueStore, id: &str) -> Result<SwabVisit, DatabaseError> {
    let mut data = load_data(store)?;
    let idx = data
        .profile
        .swab_visits
        .iter()
        .position(|v| v.id == id)
        .ok_or_else(|| DatabaseError::not_found("swab visit", id))?;
    let removed = data.profile.swab_visits.remove(idx);
    crate::data::save_data(store, &data)?;
    Ok(removed)
}

// ═══════════════════════════════════════════
// Specialists
// ═══════════════════════════════════════════

pub fn add_specialist(
    store: &dyn KeyValueStore,
    specialist_type: SpecialistType,
    type_other: Option<String>,
    start_date: NaiveDate,
) -> Result<Specialist, DatabaseError> {
    let specialist = Specialist {
        id: new_id(),
        specialist_type,
        type_other: match specialist_type {
            SpecialistType::Other => type_other.filter(|s| !s.trim().is_empty()),
            _ => None,
        },
        start_date,
        end_date: None,
        still_active: true,
    };
    update_data(store, |data| data.profile.specialists.push(specialist.clone()))?;
    Ok(specialist)
}

/// Mark a specialist's care as ended on `end_date`.
pub fn end_specialist(
    store: &dyn KeyValueStore,
    id: &str,
    end_date: NaiveDate,
) -> Result<Specialist, DatabaseError> {
    let mut data = load_data(store)?;
    let specialist = data
        .profile
        .specialists
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| DatabaseError::not_found("specialist", id))?;
    specialist.end_date = Some(end_date);
    specialist.still_active = false;
    let ended = specialist.clone();
    crate::data::save_data(store, &data)?;
    Ok(ended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureTogglesPatch, SwabTestPatch, SwabTestResult};
    use crate::store::{keys, MemoryStore};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn defaults_for_empty_store() {
        let store = MemoryStore::new();
        let p = get_profile(&store).unwrap();
        assert_eq!(p.swab_test.result, SwabTestResult::NotDone);
        assert!(p.specialists.is_empty());
        assert!(!p.support_removed);
    }

    #[test]
    fn scores_merge_per_zone() {
        let store = MemoryStore::new();
        update_profile(
            &store,
            ProfilePatch {
                swab_test: Some(SwabTestPatch {
                    result: Some(SwabTestResult::Positive),
                    scores: Some(SwabScores {
                        clitoride: Some(3),
                        forchetta: Some(7),
                        ..SwabScores::default()
                    }),
                    ..SwabTestPatch::default()
                }),
                ..ProfilePatch::default()
            },
        )
        .unwrap();

        let p = update_profile(
            &store,
            ProfilePatch {
                swab_test: Some(SwabTestPatch {
                    scores: Some(SwabScores {
                        forchetta: Some(5),
                        labbro_destro: Some(2),
                        ..SwabScores::default()
                    }),
                    ..SwabTestPatch::default()
                }),
                ..ProfilePatch::default()
            },
        )
        .unwrap();

        let scores = p.swab_test.scores.unwrap();
        assert_eq!(scores.clitoride, Some(3));
        assert_eq!(scores.forchetta, Some(5));
        assert_eq!(scores.labbro_destro, Some(2));
        assert_eq!(scores.labbro_sinistro, None);
        assert_eq!(p.swab_test.result, SwabTestResult::Positive);
    }

    #[test]
    fn patch_without_scores_keeps_them() {
        let mut profile = Profile::default();
        profile.swab_test.scores = Some(SwabScores {
            clitoride: Some(4),
            ..SwabScores::default()
        });
        merge_profile(
            &mut profile,
            ProfilePatch {
                swab_test: Some(SwabTestPatch {
                    note: Some("controllo".into()),
                    ..SwabTestPatch::default()
                }),
                features: Some(FeatureTogglesPatch {
                    voiding_diary_enabled: Some(true),
                }),
                ..ProfilePatch::default()
            },
        );
        assert_eq!(profile.swab_test.scores.unwrap().clitoride, Some(4));
        assert_eq!(profile.swab_test.note.as_deref(), Some("controllo"));
        assert!(profile.features.voiding_diary_enabled);
    }

    #[test]
    fn display_name_fallbacks() {
        let mut p = Profile {
            name: Some("Giuly".into()),
            ..Profile::default()
        };
        assert_eq!(display_name(&p).as_deref(), Some("Giuly"));
        p.first_name = Some("Giulia".into());
        assert_eq!(display_name(&p).as_deref(), Some("Giulia"));
        p.last_name = Some("Rossi".into());
        assert_eq!(display_name(&p).as_deref(), Some("Giulia Rossi"));
        assert_eq!(display_name(&Profile::default()), None);
    }

    #[test]
    fn age_from_birth_date() {
        let mut p = Profile {
            age: Some(30),
            ..Profile::default()
        };
        assert_eq!(age_on(&p, d("2024-06-01")), Some(30));
        p.date_of_birth = Some(d("1990-06-02"));
        assert_eq!(age_on(&p, d("2024-06-01")), Some(33));
        assert_eq!(age_on(&p, d("2024-06-02")), Some(34));
        assert_eq!(age_on(&p, d("1980-01-01")), None);
    }

    #[test]
    fn swab_visits_sorted_and_removable() {
        let store = MemoryStore::new();
        let late = add_swab_visit(&store, d("2024-05-01"), SwabScores::default()).unwrap();
        add_swab_visit(&store, d("2024-01-10"), SwabScores::default()).unwrap();
        let dates: Vec<NaiveDate> = get_profile(&store).unwrap().swab_visits.iter().map(|v| v.date).collect();
        assert_eq!(dates, vec![d("2024-01-10"), d("2024-05-01")]);

        remove_swab_visit(&store, &late.id).unwrap();
        assert_eq!(get_profile(&store).unwrap().swab_visits.len(), 1);
        assert!(remove_swab_visit(&store, &late.id).is_err());
    }

    #[test]
    fn specialist_lifecycle() {
        let store = MemoryStore::new();
        let s = add_specialist(&store, SpecialistType::Physiotherapist, Some("x".into()), d("2024-01-01")).unwrap();
        assert_eq!(s.type_other, None);
        assert!(s.still_active);

        let ended = end_specialist(&store, &s.id, d("2024-04-01")).unwrap();
        assert!(!ended.still_active);
        assert_eq!(get_profile(&store).unwrap().specialists[0].end_date, Some(d("2024-04-01")));
    }

    #[test]
    fn legacy_specialist_defaults_active() {
        let store = MemoryStore::new();
        store
            .set(
                keys::DATA,
                r#"{"profile":{"specialists":[{"id":"s1","type":"ginecologo","startDate":"2023-01-01"}]}}"#,
            )
            .unwrap();
        let p = get_profile(&store).unwrap();
        assert!(p.specialists[0].still_active);
        assert_eq!(p.specialists[0].specialist_type, SpecialistType::Gynecologist);
    }
}
