use chrono::{DateTime, Utc};
use common::model::template::{DocumentTemplate, FieldSpec, FieldType, TemplateCategory};
use common::FORMAT_VERSION;

/// 2024-01-01T00:00:00Z, the creation time stamped on every seed.
const SEED_EPOCH: i64 = 1_704_067_200;

/// The seeded templates, one per category. Ids are stable so seeding an
/// existing catalog never adds a second copy.
pub fn builtin_templates() -> Vec<DocumentTemplate> {
    vec![
        seed(
            "builtin-transport-authorization",
            "Transport authorization request",
            TemplateCategory::TransportAuthorization,
            "To the Municipal Registry Office\n\n\
             Request for authorization to transport the remains of {{FULL_NAME}}, \
             born in {{BIRTH_PLACE}} on {{BIRTH_DATE}}, deceased in {{DEATH_PLACE}} \
             on {{DEATH_DATE}} at {{DEATH_TIME}}.\n\
             Destination: {{DESTINATION}}\n\n\
             Requested by {{REQUESTER_NAME}} ({{REQUESTER_PHONE}}).\n\
             Case {{CASE_NUMBER}}, {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text).required(),
                FieldSpec::new("Place of birth", "BIRTH_PLACE", FieldType::Text),
                FieldSpec::new("Date of birth", "BIRTH_DATE", FieldType::Date),
                FieldSpec::new("Place of death", "DEATH_PLACE", FieldType::Text),
                FieldSpec::new("Date of death", "DEATH_DATE", FieldType::Date).required(),
                FieldSpec::new("Time of death", "DEATH_TIME", FieldType::Time),
                FieldSpec::new("Destination", "DESTINATION", FieldType::Text).required(),
                FieldSpec::new("Requester", "REQUESTER_NAME", FieldType::Text),
                FieldSpec::new("Requester phone", "REQUESTER_PHONE", FieldType::Phone),
            ],
        ),
        seed(
            "builtin-parish-communication",
            "Parish funeral notice",
            TemplateCategory::ParishCommunication,
            "Dear Father,\n\n\
             we kindly ask you to celebrate the funeral of {{FULL_NAME}}, \
             who passed away on {{DEATH_DATE}}, at {{PARISH}} on {{SERVICE_DATE}} \
             at {{SERVICE_TIME}}.\n\n\
             The family can be reached at {{REQUESTER_PHONE}}.\n\
             {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text).required(),
                FieldSpec::new("Date of death", "DEATH_DATE", FieldType::Date),
                FieldSpec::new("Parish", "PARISH", FieldType::Text).required(),
                FieldSpec::new("Service date", "SERVICE_DATE", FieldType::Date).required(),
                FieldSpec::new("Service time", "SERVICE_TIME", FieldType::Time),
                FieldSpec::new("Family phone", "REQUESTER_PHONE", FieldType::Phone),
            ],
        ),
        seed(
            "builtin-invoice",
            "Funeral services invoice",
            TemplateCategory::Invoice,
            "Invoice for case {{CASE_NUMBER}}\n\
             Billed to: {{REQUESTER_NAME}} <{{REQUESTER_EMAIL}}>\n\
             Services for the late {{FULL_NAME}}\n\n\
             Total due: {{AMOUNT}}\n\
             Issued on {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Customer", "REQUESTER_NAME", FieldType::Text).required(),
                FieldSpec::new("Customer email", "REQUESTER_EMAIL", FieldType::Email),
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text),
                FieldSpec::new("Amount", "AMOUNT", FieldType::Text).required(),
            ],
        ),
        seed(
            "builtin-contract",
            "Funeral service agreement",
            TemplateCategory::Contract,
            "Agreement between the funeral home and {{REQUESTER_NAME}}, \
             reachable at {{REQUESTER_PHONE}} / {{REQUESTER_EMAIL}}, \
             for the funeral of {{FULL_NAME}} (case {{CASE_NUMBER}}).\n\n\
             Agreed services: {{SERVICES}}\n\n\
             Signed on {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Client", "REQUESTER_NAME", FieldType::Text).required(),
                FieldSpec::new("Client phone", "REQUESTER_PHONE", FieldType::Phone),
                FieldSpec::new("Client email", "REQUESTER_EMAIL", FieldType::Email),
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text).required(),
                FieldSpec::new("Services", "SERVICES", FieldType::LongText).required(),
            ],
        ),
        seed(
            "builtin-death-certificate",
            "Death certificate request",
            TemplateCategory::DeathCertificate,
            "The undersigned {{REQUESTER_NAME}} requests a certified copy of the \
             death certificate of {{FULL_NAME}}, born on {{BIRTH_DATE}} in \
             {{BIRTH_PLACE}}, deceased on {{DEATH_DATE}} in {{DEATH_PLACE}}.\n\
             {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Requester", "REQUESTER_NAME", FieldType::Text).required(),
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text).required(),
                FieldSpec::new("Date of birth", "BIRTH_DATE", FieldType::Date),
                FieldSpec::new("Place of birth", "BIRTH_PLACE", FieldType::Text),
                FieldSpec::new("Date of death", "DEATH_DATE", FieldType::Date).required(),
                FieldSpec::new("Place of death", "DEATH_PLACE", FieldType::Text),
            ],
        ),
        seed(
            "builtin-checklist",
            "Case checklist",
            TemplateCategory::Checklist,
            "Checklist for {{FULL_NAME}} (case {{CASE_NUMBER}})\n\n\
             - Death certificate collected\n\
             - Transport authorization filed\n\
             - Parish notified\n\
             - Flowers ordered\n\
             - Invoice issued",
            vec![
                FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text),
                FieldSpec::new("Case number", "CASE_NUMBER", FieldType::Text),
            ],
        ),
        seed(
            "builtin-receipt",
            "Payment receipt",
            TemplateCategory::Receipt,
            "Received from {{REQUESTER_NAME}} the sum of {{AMOUNT}} \
             for services related to case {{CASE_NUMBER}}.\n\
             {{CURRENT_DATE}}",
            vec![
                FieldSpec::new("Payer", "REQUESTER_NAME", FieldType::Text).required(),
                FieldSpec::new("Amount", "AMOUNT", FieldType::Text).required(),
            ],
        ),
        seed(
            "builtin-other",
            "Blank letter",
            TemplateCategory::Other,
            "{{CURRENT_DATE}}\n\nRe: {{FULL_NAME}}\n\n{{BODY}}",
            vec![FieldSpec::new("Body", "BODY", FieldType::LongText)],
        ),
    ]
}

fn seed(
    id: &str,
    name: &str,
    category: TemplateCategory,
    content: &str,
    fields: Vec<FieldSpec>,
) -> DocumentTemplate {
    let created = DateTime::<Utc>::from_timestamp(SEED_EPOCH, 0).unwrap_or_default();
    DocumentTemplate {
        id: id.to_string(),
        name: name.to_string(),
        category,
        content: content.to_string(),
        fields,
        is_built_in: true,
        notes: String::new(),
        creator_label: "system".to_string(),
        created_at: created,
        modified_at: created,
        format_version: FORMAT_VERSION,
    }
}
