use crate::error::{Field, ValidationErrors};
use crate::models::{NewStudyEvent, StudyMaterial, Subject};

/// raw study log input as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyLogForm {
    /// subject code or numeric id
    pub subject: String,
    /// material code ("QA", "QB", "OTHER") or label
    pub material: String,
    pub video_count: String,
    pub solve_count: String,
    pub minutes: String,
}

fn find_subject<'a>(catalog: &'a [Subject], reference: &str) -> Option<&'a Subject> {
    let by_code = catalog
        .iter()
        .find(|s| s.code.eq_ignore_ascii_case(reference));
    by_code.or_else(|| {
        let id: i64 = reference.parse().ok()?;
        catalog.iter().find(|s| s.id.0 == id)
    })
}

/// empty means 0
fn parse_count(raw: &str, field: Field, errors: &mut ValidationErrors) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    match raw.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            match raw.parse::<i64>() {
                Ok(n) if n < 0 => errors.push(field, "must not be negative"),
                Ok(_) => errors.push(field, "is too large"),
                Err(_) => errors.push(field, "must be a whole number"),
            }
            0
        }
    }
}

impl StudyLogForm {
    /// checks every field against `catalog`, collecting all errors at once
    pub fn validate(&self, catalog: &[Subject]) -> Result<NewStudyEvent, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let subject_ref = self.subject.trim();
        let subject = if subject_ref.is_empty() {
            errors.push(Field::Subject, "is required");
            None
        } else {
            let found = find_subject(catalog, subject_ref);
            if found.is_none() {
                errors.push(Field::Subject, format!("unknown subject {subject_ref:?}"));
            }
            found
        };

        let material_ref = self.material.trim();
        let material = if material_ref.is_empty() {
            errors.push(Field::Material, "is required");
            None
        } else {
            let parsed = StudyMaterial::parse(material_ref);
            if parsed.is_none() {
                errors.push(Field::Material, format!("unknown material {material_ref:?}"));
            }
            parsed
        };

        let video_count = parse_count(&self.video_count, Field::VideoCount, &mut errors);
        let solve_count = parse_count(&self.solve_count, Field::SolveCount, &mut errors);
        let minutes = parse_count(&self.minutes, Field::Minutes, &mut errors);

        match (subject, material) {
            (Some(subject), Some(material)) if errors.is_empty() => Ok(NewStudyEvent {
                subject_id: subject.id,
                material,
                video_count,
                solve_count,
                minutes,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectId;

    fn catalog() -> Vec<Subject> {
        vec![Subject {
            id: SubjectId(7),
            name: "Anatomy".to_string(),
            code: "ANA".to_string(),
            goal_video_count: 10,
            goal_question_count: 100,
            image: None,
        }]
    }

    fn form(subject: &str, video: &str, solve: &str, minutes: &str) -> StudyLogForm {
        StudyLogForm {
            subject: subject.to_string(),
            material: "QB".to_string(),
            video_count: video.to_string(),
            solve_count: solve.to_string(),
            minutes: minutes.to_string(),
        }
    }

    #[test]
    fn valid_form() {
        let event = form("ANA", "3", "2", "10").validate(&catalog()).unwrap();
        assert_eq!(event.subject_id, SubjectId(7));
        assert_eq!(event.material, StudyMaterial::QuestionBank);
        assert_eq!((event.video_count, event.solve_count, event.minutes), (3, 2, 10));
    }

    #[test]
    fn subject_by_id_and_lowercase_code() {
        assert!(form("7", "1", "", "").validate(&catalog()).is_ok());
        assert!(form("ana", "1", "", "").validate(&catalog()).is_ok());
    }

    #[test]
    fn blank_counts_default_to_zero() {
        let event = form("ANA", "", " ", "").validate(&catalog()).unwrap();
        assert_eq!((event.video_count, event.solve_count, event.minutes), (0, 0, 0));
    }

    #[test]
    fn negative_and_garbage_counts_rejected() {
        let errors = form("ANA", "-1", "abc", "-5").validate(&catalog()).unwrap_err();
        assert_eq!(errors.for_field(Field::VideoCount), Some("must not be negative"));
        assert_eq!(errors.for_field(Field::SolveCount), Some("must be a whole number"));
        assert_eq!(errors.for_field(Field::Minutes), Some("must not be negative"));
    }

    #[test]
    fn missing_and_unknown_subject() {
        let errors = form("", "1", "1", "1").validate(&catalog()).unwrap_err();
        assert_eq!(errors.for_field(Field::Subject), Some("is required"));

        let errors = form("BIO", "1", "1", "1").validate(&catalog()).unwrap_err();
        assert!(errors.for_field(Field::Subject).unwrap().contains("unknown subject"));
    }

    #[test]
    fn unknown_material() {
        let mut bad = form("ANA", "1", "1", "1");
        bad.material = "flashcards".to_string();
        let errors = bad.validate(&catalog()).unwrap_err();
        assert!(errors.for_field(Field::Material).is_some());
        assert_eq!(errors.errors.len(), 1);
    }
}
