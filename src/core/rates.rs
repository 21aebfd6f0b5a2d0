use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{RateMode, SimulationInput};
use crate::error::CatalogError;

/// CDI reference rate (percent a.a.) used when an index-linked input omits it.
pub const DEFAULT_REFERENCE_RATE: f64 = 10.65;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    Savings,
    Treasury,
    BankDeposit,
    TaxExempt,
    DigitalAccount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub annual_rate: f64,
    pub category: ProductCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalBank {
    pub id: String,
    pub name: String,
    pub products: Vec<Product>,
}

/// Read-only reference data handed to [`resolve_annual_rate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCatalog {
    pub default_reference_rate: f64,
    pub products: Vec<Product>,
    pub digital_banks: Vec<DigitalBank>,
}

impl Default for RateCatalog {
    fn default() -> Self {
        let product = |id: &str, name: &str, annual_rate: f64, category| Product {
            id: id.to_string(),
            name: name.to_string(),
            annual_rate,
            category,
        };

        Self {
            default_reference_rate: DEFAULT_REFERENCE_RATE,
            products: vec![
                product("poupanca", "Poupança", 6.17, ProductCategory::Savings),
                product("tesouro-selic", "Tesouro Selic", 10.75, ProductCategory::Treasury),
                product("tesouro-ipca", "Tesouro IPCA+", 11.20, ProductCategory::Treasury),
                product("cdb", "CDB 100% CDI", 10.65, ProductCategory::BankDeposit),
                product("lci", "LCI 90% CDI", 9.59, ProductCategory::TaxExempt),
                product("lca", "LCA 92% CDI", 9.80, ProductCategory::TaxExempt),
            ],
            digital_banks: vec![
                DigitalBank {
                    id: "nubank".to_string(),
                    name: "Nubank".to_string(),
                    products: vec![
                        product("caixinha", "Caixinha", 10.65, ProductCategory::DigitalAccount),
                        product("cdb-liquidez", "CDB Liquidez Diária", 10.65, ProductCategory::BankDeposit),
                    ],
                },
                DigitalBank {
                    id: "inter".to_string(),
                    name: "Banco Inter".to_string(),
                    products: vec![
                        product("porquinho", "Porquinho", 10.65, ProductCategory::DigitalAccount),
                        product("cdb-mais", "CDB Mais Limite", 11.72, ProductCategory::BankDeposit),
                    ],
                },
                DigitalBank {
                    id: "c6".to_string(),
                    name: "C6 Bank".to_string(),
                    products: vec![product(
                        "cdb-c6",
                        "CDB C6 102% CDI",
                        10.86,
                        ProductCategory::BankDeposit,
                    )],
                },
            ],
        }
    }
}

impl RateCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn digital_bank_product(&self, bank_id: &str, product_id: &str) -> Option<&Product> {
        self.digital_banks
            .iter()
            .find(|b| b.id == bank_id)
            .and_then(|b| b.products.iter().find(|p| p.id == product_id))
    }
}

/// Effective annual rate in percent. Missing or malformed configuration
/// resolves to 0 instead of failing.
pub fn resolve_annual_rate(input: &SimulationInput, catalog: &RateCatalog) -> f64 {
    let raw = match input.rate_mode {
        RateMode::FixedProduct => input
            .fixed_product
            .as_ref()
            .and_then(|fp| {
                fp.annual_rate.or_else(|| {
                    fp.product_id
                        .as_deref()
                        .and_then(|id| catalog.product(id))
                        .map(|p| p.annual_rate)
                })
            })
            .unwrap_or(0.0),
        RateMode::DigitalBankProduct => input
            .digital_bank_ref
            .as_ref()
            .and_then(|r| catalog.digital_bank_product(&r.bank_id, &r.product_id))
            .map(|p| p.annual_rate)
            .unwrap_or(0.0),
        RateMode::IndexPercentage => {
            let index = input.index_value.unwrap_or(catalog.default_reference_rate);
            let pct = input.index_percentage.unwrap_or(100.0);
            index * (pct / 100.0)
        }
        RateMode::Custom => input.custom_rate.unwrap_or(0.0),
    };

    sanitize_rate(raw)
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate >= 0.0 {
        rate
    } else {
        debug!(rate, "unresolvable annual rate, falling back to 0");
        0.0
    }
}
