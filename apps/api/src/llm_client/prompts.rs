// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.

/// Instruction that enforces JSON-only output. Gemini has no system slot in
/// the one-shot call used here, so this is prepended to the user prompt.
pub const JSON_ONLY_INSTRUCTION: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
