use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::RankerConfig;
use crate::error::ExtractError;
use crate::models::{CandidateIdentity, CvDocument, Gender, SkillResponse};

const TOOL_NAME: &str = "get_answer_for_user_query";

/// Seam between the pipeline and the model provider. One outbound request per
/// call; retry policy belongs to the caller, never here.
#[async_trait]
pub trait CandidateExtractor {
    async fn extract_identity(
        &self,
        document: &CvDocument,
    ) -> Result<CandidateIdentity, ExtractError>;

    async fn extract_skill(
        &self,
        document: &CvDocument,
        skill: &str,
    ) -> Result<SkillResponse, ExtractError>;
}

/// Chat-completions extractor forcing a single tool call whose arguments must
/// conform to a fixed schema. The skill under question is carried in the
/// instruction and field descriptions only, never in field names.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(config: &RankerConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_base.join("chat/completions")?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    async fn call_tool(
        &self,
        instruction: String,
        description: &str,
        parameters: Value,
    ) -> Result<Value, ExtractError> {
        let payload = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{ "role": "user", "content": instruction }],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": description,
                    "parameters": parameters,
                },
            }],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(ExtractError::Status {
                status: status.as_u16(),
                details,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        tool_arguments(completion)
    }
}

#[async_trait]
impl CandidateExtractor for OpenAiExtractor {
    async fn extract_identity(
        &self,
        document: &CvDocument,
    ) -> Result<CandidateIdentity, ExtractError> {
        let arguments = self
            .call_tool(
                identity_instruction(document),
                "Extracts the name, email address, age and gender of the candidate",
                identity_parameters(),
            )
            .await?;

        parse_identity(&arguments)
    }

    async fn extract_skill(
        &self,
        document: &CvDocument,
        skill: &str,
    ) -> Result<SkillResponse, ExtractError> {
        let arguments = self
            .call_tool(
                skill_instruction(document, skill),
                "Get the user answer or reply with 0 years when the skill is not mentioned",
                skill_parameters(skill),
            )
            .await?;

        parse_skill(&arguments, skill)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Debug, Deserialize)]
struct ToolFunction {
    arguments: String,
}

fn tool_arguments(completion: ChatCompletion) -> Result<Value, ExtractError> {
    let call = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.tool_calls.into_iter().next())
        .ok_or(ExtractError::Schema {
            schema: "tool_call",
            details: "completion contains no tool call".to_string(),
        })?;

    Ok(serde_json::from_str(&call.function.arguments)?)
}

fn identity_instruction(document: &CvDocument) -> String {
    format!(
        "Given the following extracted parts of a long document and a question, \
         create a final answer.\n\n\
         QUESTION: What are the name, email address, age and gender of the candidate?\n\
         =========\n{}\n=========\n",
        document.text
    )
}

fn skill_instruction(document: &CvDocument, skill: &str) -> String {
    format!(
        "Based on the following text, how many years of experience does this person \
         have in {skill}? And tell whether this person has experience in {skill}. \
         If this person has experience in {skill} but you cannot figure out the \
         years, reply with 1.\n\n{}",
        document.text
    )
}

fn identity_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "the name of the candidate if available in the text",
            },
            "email": {
                "type": "string",
                "description": "the email address of the candidate if available in the text",
            },
            "age": {
                "type": "integer",
                "description": "the age of the candidate if available in the text",
            },
            "gender": {
                "type": "string",
                "enum": ["female", "male", "unknown"],
                "description": "whether the candidate is female or male; unknown when the text does not say",
            },
        },
        "required": ["name", "email", "age", "gender"],
    })
}

fn skill_parameters(skill: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "has_skill": {
                "type": "boolean",
                "description": format!("whether the candidate has experience with {skill}"),
            },
            "years": {
                "type": "integer",
                "description": format!(
                    "how many years of experience the candidate has with {skill}; \
                     zero when {skill} is not mentioned"
                ),
            },
        },
        "required": ["has_skill", "years"],
    })
}

pub(crate) fn parse_identity(arguments: &Value) -> Result<CandidateIdentity, ExtractError> {
    let name = arguments
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_error("identity", "name missing or not a string"))?;

    let age = arguments
        .get("age")
        .and_then(Value::as_i64)
        .ok_or_else(|| schema_error("identity", "age missing or not an integer"))?;

    let gender = arguments
        .get("gender")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_error("identity", "gender missing or not a string"))?;

    let email = arguments
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(CandidateIdentity {
        name: name.to_string(),
        email: email.to_string(),
        age: age.max(0),
        gender: parse_gender(gender),
    })
}

fn parse_gender(raw: &str) -> Gender {
    match raw.to_lowercase().as_str() {
        "female" => Gender::Female,
        "male" => Gender::Male,
        _ => Gender::Unknown,
    }
}

pub(crate) fn parse_skill(arguments: &Value, skill: &str) -> Result<SkillResponse, ExtractError> {
    let has_skill = arguments
        .get("has_skill")
        .and_then(Value::as_bool)
        .ok_or_else(|| schema_error("skill", "has_skill missing or not a boolean"))?;

    // A null or absent year count is a "no experience" answer, not a
    // schema violation.
    let years = match arguments.get("years") {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_i64()
            .ok_or_else(|| schema_error("skill", "years is not an integer"))?,
    };

    Ok(SkillResponse {
        skill: skill.to_string(),
        has_skill,
        years: years.max(0),
    })
}

fn schema_error(schema: &'static str, details: &str) -> ExtractError {
    ExtractError::Schema {
        schema,
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_arguments_parse_into_typed_response() {
        let arguments = json!({
            "name": "John Doe",
            "email": "john.doe@gmail.com",
            "age": 31,
            "gender": "male",
        });

        let identity = parse_identity(&arguments).expect("all fields present");
        assert_eq!(identity.name, "John Doe");
        assert_eq!(identity.email, "john.doe@gmail.com");
        assert_eq!(identity.age, 31);
        assert_eq!(identity.gender, Gender::Male);
    }

    #[test]
    fn identity_with_missing_age_is_a_schema_failure() {
        let arguments = json!({ "name": "John Doe", "gender": "male" });
        assert!(matches!(
            parse_identity(&arguments),
            Err(ExtractError::Schema { schema: "identity", .. })
        ));
    }

    #[test]
    fn identity_with_mistyped_age_is_a_schema_failure() {
        let arguments = json!({
            "name": "John Doe",
            "email": "",
            "age": "thirty",
            "gender": "male",
        });
        assert!(parse_identity(&arguments).is_err());
    }

    #[test]
    fn unexpected_gender_value_maps_to_unknown() {
        let arguments = json!({
            "name": "A B",
            "email": "",
            "age": 0,
            "gender": "none",
        });

        let identity = parse_identity(&arguments).expect("parses");
        assert_eq!(identity.gender, Gender::Unknown);
    }

    #[test]
    fn skill_arguments_parse_into_typed_response() {
        let arguments = json!({ "has_skill": true, "years": 4 });
        let response = parse_skill(&arguments, "PHP").expect("parses");
        assert_eq!(response.skill, "PHP");
        assert!(response.has_skill);
        assert_eq!(response.years, 4);
    }

    #[test]
    fn null_years_normalize_to_zero() {
        let arguments = json!({ "has_skill": false, "years": null });
        let response = parse_skill(&arguments, "CSS").expect("parses");
        assert_eq!(response.years, 0);
    }

    #[test]
    fn negative_years_are_clamped_to_zero() {
        let arguments = json!({ "has_skill": true, "years": -2 });
        let response = parse_skill(&arguments, "CSS").expect("parses");
        assert_eq!(response.years, 0);
    }

    #[test]
    fn missing_has_skill_is_a_schema_failure() {
        let arguments = json!({ "years": 3 });
        assert!(matches!(
            parse_skill(&arguments, "CSS"),
            Err(ExtractError::Schema { schema: "skill", .. })
        ));
    }

    #[test]
    fn completion_without_tool_call_is_a_schema_failure() {
        let completion = ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    tool_calls: Vec::new(),
                },
            }],
        };

        assert!(matches!(
            tool_arguments(completion),
            Err(ExtractError::Schema { schema: "tool_call", .. })
        ));
    }

    #[test]
    fn tool_call_arguments_are_decoded_from_json_text() {
        let completion = ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    tool_calls: vec![ToolCall {
                        function: ToolFunction {
                            arguments: r#"{"has_skill":true,"years":2}"#.to_string(),
                        },
                    }],
                },
            }],
        };

        let arguments = tool_arguments(completion).expect("valid json");
        assert_eq!(arguments["years"], 2);
    }
}
