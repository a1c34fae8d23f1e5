/// Instruction text sent with every analysis request. Deterministic, no
/// state: the same schema is demanded from every tier so the extractor
/// only has to deal with one shape.
pub fn build() -> String {
    "YOU ARE A FOOD ANALYSIS EXPERT. Look carefully at this picture of an ulam \
     (a Filipino dish) and analyze it step by step:\n\
     \n\
     1. DISH RECOGNITION:\n\
     - Identify the dish and any sides visible in the picture\n\
     - Judge the portion size visually\n\
     \n\
     2. NUTRITION ESTIMATE:\n\
     - Estimate calories and macros for the visible portion\n\
     - Note anything health-relevant (sodium, frying, vegetables)\n\
     \n\
     ANSWER FORMAT (USE EXACTLY THIS JSON, NO OTHER TEXT):\n\
     {\n\
       \"ulam_name\": \"name of the dish\",\n\
       \"macros\": {\n\
         \"calories\": number or \"N/A\",\n\
         \"protein_g\": number or \"N/A\",\n\
         \"carbs_g\": number or \"N/A\",\n\
         \"fat_g\": number or \"N/A\"\n\
       },\n\
       \"health_facts\": \"short nutrition notes\",\n\
       \"warnings\": \"dietary warnings, or an empty string\"\n\
     }\n\
     \n\
     When you are uncertain, give your best guess instead of refusing. \
     Use \"N/A\" only when no estimate is possible at all."
        .to_string()
}

/// Variant for the image-less tiers: same schema, plus a note that the
/// picture is missing so the model estimates a typical serving and says so.
pub fn degraded(prompt: &str) -> String {
    format!(
        "{}\n\nNOTE: the picture could not be attached to this request. \
         Give your best general estimate for a typical serving of a common \
         Filipino ulam, mark the fields you are unsure about with \"N/A\", \
         and state in \"warnings\" that this is an estimate made without \
         seeing the picture.",
        prompt
    )
}
