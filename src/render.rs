use anyhow::{bail, Result};
use serde_json::Value;

use crate::models::DocumentType;

pub trait DocumentRenderer: Send + Sync + 'static {
    /// Fill the template for `doc_type` from the supplied data bag and return
    /// the rendered document bytes.
    fn render(&self, doc_type: DocumentType, data: &Value) -> Result<Vec<u8>>;
}

/// Plain-text template renderer. A production deployment would swap in a PDF
/// renderer behind the same trait.
#[derive(Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn field<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("____________")
}

fn render_rent_agreement(data: &Value) -> String {
    format!(
        "RENT AGREEMENT\n\n\
         This Rent Agreement is made between {landlord} (the Landlord) and {tenant} \
         (the Tenant) for the premises at {address}.\n\n\
         1. The tenancy commences on {start} for a period of {duration}.\n\
         2. The monthly rent is Rs. {rent}, payable in advance by the 5th of each month.\n\
         3. The Tenant has paid a refundable security deposit of Rs. {deposit}.\n\
         4. Either party may terminate this agreement with {notice} notice in writing.\n\
         5. The premises shall be used for residential purposes only.\n\n\
         Signed by the Landlord: ____________\n\
         Signed by the Tenant:   ____________\n\
         Witness 1: ____________    Witness 2: ____________\n",
        landlord = field(data, "landlord_name"),
        tenant = field(data, "tenant_name"),
        address = field(data, "property_address"),
        start = field(data, "start_date"),
        duration = field(data, "duration"),
        rent = field(data, "monthly_rent"),
        deposit = field(data, "security_deposit"),
        notice = field(data, "notice_period"),
    )
}

fn render_legal_notice(data: &Value) -> String {
    format!(
        "LEGAL NOTICE\n\n\
         To: {recipient}\n\
         From: {sender}\n\
         Date: {date}\n\n\
         Subject: {subject}\n\n\
         Under instructions from and on behalf of my client, {sender}, I hereby serve \
         upon you the following notice:\n\n\
         {body}\n\n\
         You are called upon to comply with the above within {deadline} of receipt of \
         this notice, failing which my client shall be constrained to initiate \
         appropriate legal proceedings against you at your risk as to costs and \
         consequences.\n",
        recipient = field(data, "recipient_name"),
        sender = field(data, "sender_name"),
        date = field(data, "date"),
        subject = field(data, "subject"),
        body = field(data, "grievance"),
        deadline = field(data, "deadline"),
    )
}

fn render_affidavit(data: &Value) -> String {
    format!(
        "AFFIDAVIT\n\n\
         I, {deponent}, son/daughter of {parent}, resident of {address}, do hereby \
         solemnly affirm and declare as under:\n\n\
         {statement}\n\n\
         I state that the contents of this affidavit are true and correct to the best \
         of my knowledge and belief and nothing material has been concealed therefrom.\n\n\
         Place: {place}\n\
         Date: {date}\n\n\
         DEPONENT\n",
        deponent = field(data, "deponent_name"),
        parent = field(data, "parent_name"),
        address = field(data, "address"),
        statement = field(data, "statement"),
        place = field(data, "place"),
        date = field(data, "date"),
    )
}

fn render_consumer_complaint(data: &Value) -> String {
    format!(
        "CONSUMER COMPLAINT\n\n\
         Before the District Consumer Disputes Redressal Commission\n\n\
         Complainant: {complainant}\n\
         Opposite Party: {opposite_party}\n\n\
         1. The complainant purchased {product} on {purchase_date} for a consideration \
         of Rs. {amount}.\n\
         2. Grievance: {grievance}\n\
         3. The complainant approached the opposite party for redressal but received no \
         satisfactory response, which amounts to deficiency in service under the \
         Consumer Protection Act, 2019.\n\n\
         Relief sought: {relief}\n\n\
         Complainant's signature: ____________\n",
        complainant = field(data, "complainant_name"),
        opposite_party = field(data, "opposite_party"),
        product = field(data, "product"),
        purchase_date = field(data, "purchase_date"),
        amount = field(data, "amount"),
        grievance = field(data, "grievance"),
        relief = field(data, "relief_sought"),
    )
}

impl DocumentRenderer for TemplateRenderer {
    fn render(&self, doc_type: DocumentType, data: &Value) -> Result<Vec<u8>> {
        if !data.is_object() {
            bail!("document data must be a JSON object");
        }

        let text = match doc_type {
            DocumentType::RentAgreement => render_rent_agreement(data),
            DocumentType::LegalNotice => render_legal_notice(data),
            DocumentType::Affidavit => render_affidavit(data),
            DocumentType::ConsumerComplaint => render_consumer_complaint(data),
        };
        Ok(text.into_bytes())
    }
}
