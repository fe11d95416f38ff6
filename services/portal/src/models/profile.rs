//! Profile completion model and gateway payloads

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::models::session::AccountType;
use crate::validation::{validate_cep, validate_cnpj, validate_cpf, validate_phone};

/// Postal address embedded in profile completion requests.
///
/// Street, neighborhood, city and state usually come from the postal-code
/// lookup and are not validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Account-type specific details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Residential {
        cpf: Option<String>,
        /// Raw form input, defaults to one resident
        residents: Option<String>,
    },
    Business {
        cnpj: Option<String>,
        company_name: Option<String>,
    },
}

/// Everything the donor supplies to complete their profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteProfile {
    pub phone: String,
    pub address: Address,
    pub kind: ProfileKind,
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CompleteProfile {
    pub fn account_type(&self) -> AccountType {
        match self.kind {
            ProfileKind::Residential { .. } => AccountType::Residential,
            ProfileKind::Business { .. } => AccountType::Business,
        }
    }

    /// Field-level checks run before any network call
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if !validate_phone(&self.phone) {
            errors.add("phone", "Invalid phone number");
        }
        if !validate_cep(&self.address.cep) {
            errors.add("cep", "Invalid postal code");
        }
        if self.address.number.trim().is_empty() {
            errors.add("number", "Street number is required");
        }

        match &self.kind {
            ProfileKind::Residential { cpf, residents } => {
                if provided(cpf).is_some_and(|cpf| !validate_cpf(cpf)) {
                    errors.add("cpf", "Invalid CPF");
                }
                if parse_residents(residents).is_none() {
                    errors.add("residents", "Number of residents must be a positive number");
                }
            }
            ProfileKind::Business { cnpj, company_name } => {
                if provided(cnpj).is_some_and(|cnpj| !validate_cnpj(cnpj)) {
                    errors.add("cnpj", "Invalid CNPJ");
                }
                if provided(company_name).is_some_and(|name| name.chars().count() < 3) {
                    errors.add("companyName", "Company name must have at least 3 characters");
                }
            }
        }

        errors
    }

    /// Residence endpoint payload, `None` for business profiles
    pub fn residence_request(&self) -> Option<ResidenceProfileRequest> {
        match &self.kind {
            ProfileKind::Residential { cpf, residents } => Some(ResidenceProfileRequest {
                telefone: self.phone.clone(),
                cpf: provided(cpf).map(str::to_string),
                number_residents: parse_residents(residents).unwrap_or(1),
                address_request: self.address.clone(),
            }),
            ProfileKind::Business { .. } => None,
        }
    }

    /// Company endpoint payload, `None` for residential profiles
    pub fn company_request(&self) -> Option<CompanyProfileRequest> {
        match &self.kind {
            ProfileKind::Business { cnpj, .. } => Some(CompanyProfileRequest {
                telefone: self.phone.clone(),
                cnpj: provided(cnpj).map(str::to_string),
                address_request: self.address.clone(),
            }),
            ProfileKind::Residential { .. } => None,
        }
    }
}

fn parse_residents(residents: &Option<String>) -> Option<u32> {
    match provided(residents) {
        None => Some(1),
        Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0),
    }
}

/// Residence profile completion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceProfileRequest {
    pub telefone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    pub number_residents: u32,
    pub address_request: Address,
}

/// Company profile completion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfileRequest {
    pub telefone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    pub address_request: Address,
}

/// Identifier issued by the gateway, sent either as text or as a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClientId {
    Text(String),
    Number(u64),
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientId::Text(id) => f.write_str(id),
            ClientId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// Profile completion response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub id: Option<ClientId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address() -> Address {
        Address {
            cep: "01001-000".to_string(),
            street: "Praça da Sé".to_string(),
            number: "100".to_string(),
            complement: None,
            neighborhood: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        }
    }

    fn residential(cpf: Option<&str>, residents: Option<&str>) -> CompleteProfile {
        CompleteProfile {
            phone: "(11) 98765-4321".to_string(),
            address: address(),
            kind: ProfileKind::Residential {
                cpf: cpf.map(str::to_string),
                residents: residents.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_residence_request_shape() {
        let profile = residential(Some("529.982.247-25"), Some("3"));
        assert!(profile.validate().is_empty());

        let body = serde_json::to_value(profile.residence_request().unwrap()).unwrap();
        assert_eq!(body["telefone"], json!("(11) 98765-4321"));
        assert_eq!(body["cpf"], json!("529.982.247-25"));
        assert_eq!(body["numberResidents"], json!(3));
        assert_eq!(body["addressRequest"]["cep"], json!("01001-000"));
        assert!(body["addressRequest"].get("complement").is_none());
        assert!(profile.company_request().is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let profile = residential(Some("  "), None);
        assert!(profile.validate().is_empty());

        let request = profile.residence_request().unwrap();
        assert_eq!(request.cpf, None);
        assert_eq!(request.number_residents, 1);
    }

    #[test]
    fn test_invalid_fields_are_reported() {
        let mut profile = residential(Some("111.111.111-11"), Some("zero"));
        profile.phone = "1234".to_string();
        profile.address.cep = "0100".to_string();
        profile.address.number = " ".to_string();

        let errors = profile.validate();
        for field in ["phone", "cep", "number", "cpf", "residents"] {
            assert!(errors.get(field).is_some(), "missing {}", field);
        }

        assert!(residential(None, Some("0")).validate().get("residents").is_some());
    }

    #[test]
    fn test_business_profile_validation() {
        let profile = CompleteProfile {
            phone: "11987654321".to_string(),
            address: address(),
            kind: ProfileKind::Business {
                cnpj: Some("11.222.333/0001-80".to_string()),
                company_name: Some("AB".to_string()),
            },
        };
        assert_eq!(profile.account_type(), AccountType::Business);

        let errors = profile.validate();
        assert_eq!(errors.get("cnpj"), Some("Invalid CNPJ"));
        assert!(errors.get("companyName").is_some());

        let body = serde_json::to_value(profile.company_request().unwrap()).unwrap();
        assert_eq!(body["cnpj"], json!("11.222.333/0001-80"));
        assert!(body.get("companyName").is_none());
    }

    #[test]
    fn test_profile_response_accepts_text_or_number_id() {
        let text: ProfileResponse = serde_json::from_value(json!({"id": "42"})).unwrap();
        assert_eq!(text.id.unwrap().to_string(), "42");

        let number: ProfileResponse = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(number.id.unwrap().to_string(), "7");

        let missing: ProfileResponse = serde_json::from_value(json!({"clientId": "9"})).unwrap();
        assert_eq!(missing.id, None);
    }
}
