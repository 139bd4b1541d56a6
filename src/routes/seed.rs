use axum::extract::{Json, State};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::collections;
use crate::state::AppState;
use crate::store::Record;

fn sample_lawyers() -> Vec<Value> {
    vec![
        json!({
            "name": "Adv. Neha Sharma",
            "bar_council_id": "DL/12345/2015",
            "specialization": ["Family Law", "Matrimonial"],
            "languages": ["Hindi", "English"],
            "city": "Delhi",
            "state": "Delhi",
            "experience": 10,
            "price": 500,
            "rating": 4.9,
            "reviews": 210,
            "bio": "Experienced family law attorney specializing in divorce and custody cases.",
            "verified": true
        }),
        json!({
            "name": "Adv. Vinayak Verma",
            "bar_council_id": "DL/23456/2013",
            "specialization": ["Corporate Law", "Contracts"],
            "languages": ["Hindi", "English"],
            "city": "Mumbai",
            "state": "Maharashtra",
            "experience": 12,
            "price": 800,
            "rating": 4.8,
            "reviews": 180,
            "bio": "Corporate law expert with focus on business contracts and compliance.",
            "verified": true
        }),
        json!({
            "name": "Adv. Anil Kapoor",
            "bar_council_id": "MH/34567/2011",
            "specialization": ["Property Law", "Civil Law"],
            "languages": ["Hindi", "English", "Marathi"],
            "city": "Pune",
            "state": "Maharashtra",
            "experience": 15,
            "price": 1000,
            "rating": 4.6,
            "reviews": 95,
            "bio": "Property law specialist with extensive experience in civil litigation.",
            "verified": true
        }),
        json!({
            "name": "Adv. Priya Menon",
            "bar_council_id": "KA/45678/2016",
            "specialization": ["Criminal Law"],
            "languages": ["English", "Hindi", "Kannada"],
            "city": "Bangalore",
            "state": "Karnataka",
            "experience": 8,
            "price": 600,
            "rating": 4.7,
            "reviews": 150,
            "bio": "Criminal defense lawyer committed to protecting client rights.",
            "verified": true
        }),
    ]
}

fn sample_laws() -> Vec<Value> {
    vec![
        json!({
            "title": "Consumer Protection Act, 2019",
            "category": "Consumer Law",
            "state": "All India",
            "type": "act",
            "description": "Protects consumer rights against unfair trade practices. Provides for consumer tribunals and e-commerce regulations.",
            "eligibility": "All consumers who purchase goods or services",
            "how_to_apply": "File complaint with District/State/National Consumer Commission",
            "required_docs": ["Purchase receipt", "Written complaint", "ID proof"],
            "key_points": [
                "Right to safety",
                "Right to information",
                "Right to choose",
                "Right to be heard",
                "Right to seek redressal"
            ]
        }),
        json!({
            "title": "Right to Information (RTI) Act, 2005",
            "category": "Citizen Rights",
            "state": "All India",
            "type": "act",
            "description": "Empowers citizens to seek information from government bodies, ensuring accountability in public services.",
            "eligibility": "All Indian citizens",
            "how_to_apply": "Submit RTI application to concerned Public Information Officer (PIO)",
            "required_docs": ["RTI application form", "Application fee (₹10)"],
            "key_points": [
                "Get information within 30 days",
                "First appeal within 30 days",
                "Second appeal to Information Commission"
            ]
        }),
        json!({
            "title": "PM Awas Yojana (Housing for All)",
            "category": "Housing",
            "state": "All India",
            "type": "scheme",
            "description": "Government scheme providing affordable housing to urban and rural poor through subsidies and financial assistance.",
            "eligibility": "EWS/LIG families with annual income up to ₹6 lakh (urban)",
            "how_to_apply": "Apply online through PM Awas Yojana portal or visit nearest CSC center",
            "required_docs": ["Aadhaar card", "Income certificate", "Property documents", "Bank account details"],
            "key_points": [
                "Subsidy up to ₹2.67 lakh",
                "Interest rate subsidy on home loans",
                "No ownership of pucca house required"
            ]
        }),
        json!({
            "title": "Tenancy Laws in India",
            "category": "Tenant Rights",
            "state": "All India",
            "type": "info",
            "description": "Rights and responsibilities of tenants under state Rent Control Acts and the Model Tenancy Act, 2021.",
            "eligibility": "All tenants under rental agreements",
            "how_to_apply": "Register rent agreement; approach Rent Control Court for disputes",
            "required_docs": ["Rent agreement", "Rent receipts", "ID proof"],
            "key_points": [
                "Fair rent assessment",
                "Protection from unlawful eviction",
                "Security deposit (max 2-3 months rent)",
                "Notice period requirements"
            ]
        }),
    ]
}

fn into_record(value: Value) -> AppResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::internal("seed entry must be a JSON object")),
    }
}

pub async fn seed_sample_data(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let lawyers = sample_lawyers();
    let laws = sample_laws();
    let (lawyer_count, law_count) = (lawyers.len(), laws.len());

    for lawyer in lawyers {
        state
            .store
            .add(collections::LAWYERS, into_record(lawyer)?)
            .await?;
    }
    for law in laws {
        state.store.add(collections::LAWS, into_record(law)?).await?;
    }

    info!(lawyer_count, law_count, "sample data seeded");

    Ok(Json(json!({
        "success": true,
        "message": format!("Added {lawyer_count} lawyers and {law_count} laws to database"),
    })))
}
