// Extraction prompt for the Workout Parser.
// Reuses the JSON-only fragment from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::workout::MuscleGroup;

/// Extraction prompt template.
/// Replace: {json_only}, {muscle_groups}, {raw_text}
pub const WORKOUT_PARSE_PROMPT_TEMPLATE: &str = r#"{json_only}

Extract workout data from the text below and return a JSON ARRAY of set objects.

Each object has EXACTLY these keys:
{
  "exercise": "Flat Barbell Bench Press",
  "weight": 60,
  "reps": 10,
  "notes": "",
  "muscle_group": "Chest"
}

Rules:

SETS: One object per set. "3 sets of 10" or "10 reps, 3 sets" means THREE identical objects.
If no set count is given, produce one object.

EXERCISE NAMES: Title Case. Use a canonical name that states angle and equipment:
- "bench", "bench press" -> "Flat Barbell Bench Press"
- "incline bench" -> "Incline Barbell Bench Press"; "incline db" -> "Incline Dumbbell Press"
- "db" means Dumbbell, "bb" means Barbell, "ez" means EZ Bar
- "squat" -> "Barbell Back Squat" unless another variant is named
If equipment is not stated and there is no common default, keep the name as given.

WEIGHT: A number in kilograms. Convert pounds (lb, lbs) to kilograms. If weight is missing or bodyweight, use 0.

REPS: A whole number. If missing, use 0.

NOTES: Anything else the user said about the set (effort, tempo, pain). Empty string if nothing.

MUSCLE GROUP: Exactly one of: {muscle_groups}.

WORKOUT TEXT:
"{raw_text}""#;

/// Fills the template for one submission.
pub fn build_parse_prompt(raw_text: &str) -> String {
    let groups = MuscleGroup::PROMPT_CATEGORIES
        .iter()
        .map(MuscleGroup::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    WORKOUT_PARSE_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{muscle_groups}", &groups)
        .replace("{raw_text}", raw_text.trim())
}
