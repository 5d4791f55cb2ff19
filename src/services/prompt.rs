use crate::services::schema::{AdjustmentRequest, GenerationRequest, Script};
use crate::services::structured::StructuredPrompt;

pub const GENERATE_PROMPT_NAME: &str = "generateScriptPrompt";
pub const ADJUST_PROMPT_NAME: &str = "adjustScriptPrompt";

const WRITER_SYSTEM: &str =
    "You are a creative video script writer specializing in short-form content. Reply only with valid JSON.";

const EDITOR_SYSTEM: &str =
    "You are an expert video script editor. Reply only with valid JSON.";

const EXAMPLE_SCRIPT: &str = r#"{
  "hook": "Did you know that you can save hundreds of dollars a year just by making a few simple changes to your daily routine?",
  "scenes": [
    {
      "text": "Scene 1: Cut back on eating out. Bring your lunch to work or school instead of buying it.",
      "visualSuggestion": "Show a split screen of someone buying an expensive lunch vs. someone preparing a healthy meal at home."
    },
    {
      "text": "Scene 2: Cancel unused subscriptions. Many people are paying for services they no longer use or need.",
      "visualSuggestion": "Display a montage of various subscription services, like streaming platforms, gym memberships, and software."
    },
    {
      "text": "Scene 3: Look for discounts and deals. Use coupons, promo codes, and cashback apps to save money on purchases.",
      "visualSuggestion": "Show someone happily using a coupon at a grocery store or finding a great deal online."
    }
  ],
  "cta": "Follow us for more money-saving tips! #savemoney #moneysavingtips #finance"
}"#;

pub fn generation_prompt(request: &GenerationRequest) -> StructuredPrompt {
    let user = format!(
        "You will generate a script for a video based on the following information:\n\
        \n\
        Topic: {}\n\
        Format: {}\n\
        Style: {}\n\
        \n\
        The script should include:\n\
        \n\
        * A catchy hook to grab the viewer's attention.\n\
        * 3-4 scenes with text and visual suggestions.\n\
        * A closing call to action.\n\
        \n\
        Ensure the script is appropriate for the specified format and style.\n\
        \n\
        Make the video script engaging and creative, designed to capture the audience's attention from the first second. \
        Use humor, storytelling, or intriguing facts to create a memorable viewing experience. \
        Each scene should include a concise and impactful text along with creative visual suggestions that complement the narrative. \
        The call to action should be persuasive, encouraging viewers to like, follow, share, or engage further with the content. \
        Tailor the script's tone, length, and pace to fit the specified format and style.\n\
        \n\
        Remember to incorporate current trends and challenges to enhance the content's relevance and appeal.\n\
        \n\
        Example Script:\n\
        \n\
        {}",
        request.topic.trim(),
        request.format,
        request.style,
        EXAMPLE_SCRIPT,
    );

    StructuredPrompt {
        name: GENERATE_PROMPT_NAME,
        system: WRITER_SYSTEM.to_string(),
        user,
        output_schema: Script::json_schema(),
    }
}

pub fn adjustment_prompt(request: &AdjustmentRequest) -> StructuredPrompt {
    let script = &request.original_script;
    let scenes = script
        .scenes
        .iter()
        .map(|scene| {
            format!(
                "- Scene Text: \"{}\"\n  Visual Suggestion: \"{}\"",
                scene.text, scene.visual_suggestion
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        "You will be given an existing video script and a user's request for adjustments.\n\
        Your task is to intelligently modify the script according to the user's request, \
        while maintaining the script's structure (hook, scenes, cta) and quality.\n\
        \n\
        Original Script:\n\
        Hook: {}\n\
        Scenes:\n\
        {}\n\
        Call to Action: {}\n\
        \n\
        User's Adjustment Request:\n\
        \"{}\"\n\
        \n\
        Based on the user's request, provide the fully adjusted script.\n\
        If the request is vague, use your best judgment to make compelling changes.\n\
        If the request is impossible or would change the core topic so much that the original script becomes irrelevant, \
        adapt the script as closely as possible to the request instead of refusing.\n\
        Output the complete, adjusted script: the hook, every scene and the call to action.",
        script.hook,
        scenes,
        script.cta,
        request.adjustment_request.trim(),
    );

    StructuredPrompt {
        name: ADJUST_PROMPT_NAME,
        system: EDITOR_SYSTEM.to_string(),
        user,
        output_schema: Script::json_schema(),
    }
}
