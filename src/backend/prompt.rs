//! Prompt construction for LLM backends.

use super::GenerationContext;
use crate::item::ItemKind;
use crate::lang::Language;

pub const SYSTEM_PROMPT: &str = "You are a documentation assistant. You write clear, concise and \
accurate documentation comments for source code. You reply with the documentation text only.";

/// Conventions the model is asked to follow, per language.
fn style_guide(language: Language) -> &'static str {
    match language {
        Language::Python => {
            "Follow PEP 257. Start with a one-line summary. Document parameters in a Google style \
             `Args:` section with one entry per parameter, then `Returns:` and `Raises:` if applicable."
        }
        Language::Rust => {
            "Follow rustdoc conventions. Start with a one-line summary. Document parameters in a \
             `# Arguments` section as a list of `* \\`name\\` - description` entries."
        }
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            "Follow JSDoc conventions. Start with a summary sentence, then one `@param name description` \
             tag per parameter and a `@returns` tag if the function returns a value."
        }
        Language::Go => {
            "Follow Go doc comment conventions. The first sentence starts with the declared name. \
             End with a line `Parameters: a, b` listing every parameter in order."
        }
        Language::Java => {
            "Follow Javadoc conventions. Start with a summary sentence, then one `@param name description` \
             tag per parameter and `@return` if the method returns a value."
        }
        Language::Generic => "Start with a one-line summary and list every parameter.",
    }
}

/// Build the user prompt for one item.
pub fn build_prompt(ctx: &GenerationContext) -> String {
    let mut prompt = format!(
        "Write the documentation comment for the {} {} `{}`",
        ctx.language,
        ctx.kind,
        ctx.name
    );
    if let Some(parent) = &ctx.parent {
        prompt.push_str(&format!(" of `{}`", parent));
    }
    prompt.push_str(".\n\n");
    prompt.push_str(style_guide(ctx.language));
    prompt.push_str("\n\n");

    if ctx.kind != ItemKind::Class {
        if ctx.params.is_empty() {
            prompt.push_str("It takes no parameters.\n");
        } else {
            prompt.push_str(&format!(
                "Its parameters, in order, are: {}.\n",
                ctx.params.join(", ")
            ));
        }
    }
    prompt.push_str(&format!("Signature: {}\n", ctx.signature));

    if let Some(doc) = &ctx.outdated_doc {
        prompt.push_str(&format!(
            "\nThe existing documentation is out of date. Update it to match the code:\n{}\n",
            doc
        ));
    }

    prompt.push_str(&format!(
        "\n```{}\n{}\n```\n\nReturn ONLY the documentation text, without comment delimiters, \
         quotes or indentation.",
        ctx.language, ctx.excerpt
    ));
    prompt
}
