//! Prompt templates
//! Mission: System/user prompt pairs with `{placeholder}` substitution

/// A reusable prompt pair. `required` lists the placeholders the request
/// body must supply; rendering an incomplete context is a caller bug and
/// surfaces as a validation error upstream.
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
    pub required: &'static [&'static str],
}

pub const COVER_LETTER: PromptTemplate = PromptTemplate {
    system: "You are an expert career assistant. You write compelling, \
             professional cover letters tailored to the position and company. \
             Keep the tone confident but not arrogant, and the length under \
             400 words.",
    user: "Write a cover letter for the position of {position} at {company}.\n\
           Candidate details:\n\
           - Name: {first_name} {last_name}\n\
           - Email: {email}\n\
           - Phone: {phone}\n\
           - Address: {address}\n\
           Return only the letter body, ready to send.",
    required: &[
        "position",
        "company",
        "first_name",
        "last_name",
        "email",
        "phone",
        "address",
    ],
};

pub const PROFESSIONALIZE: PromptTemplate = PromptTemplate {
    system: "You are an expert editor. You rewrite text to be clear, \
             professional, and well structured while preserving its meaning. \
             Fix grammar and tone; do not invent new content.",
    user: "Rewrite the following text in a professional register:\n\n{original_text}",
    required: &["original_text"],
};

impl PromptTemplate {
    /// Substitute `{key}` placeholders from `vars`. Unknown placeholders are
    /// left untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> (String, String) {
        let mut user = self.user.to_string();
        for (key, value) in vars {
            user = user.replace(&format!("{{{key}}}"), value);
        }
        (self.system.to_string(), user)
    }

    /// Names of required placeholders missing or empty in `vars`.
    pub fn missing<'a>(&self, vars: &[(&'a str, &str)]) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|name| {
                !vars
                    .iter()
                    .any(|(key, value)| key == name && !value.trim().is_empty())
            })
            .collect()
    }
}
