use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{CustomerId, DomainResult, Email, Entity, required_text};

/// Optional contact details for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactInfo {
    /// Blank strings are stored as absent.
    fn normalized(self) -> Self {
        Self {
            phone: non_blank(self.phone),
            address: non_blank(self.address),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Unique across customers (normalized).
    pub email: Email,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

impl NewCustomer {
    /// Validate and build the record. Email uniqueness is the store's job.
    pub fn into_customer(self, id: CustomerId, now: DateTime<Utc>) -> DomainResult<Customer> {
        Ok(Customer {
            id,
            name: required_text("name", &self.name)?,
            email: Email::parse(&self.email)?,
            contact: self.contact.normalized(),
            created_at: now,
        })
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    /// Apply a patch, all-or-nothing: on error `self` is unchanged.
    pub fn apply(&mut self, patch: CustomerPatch) -> DomainResult<()> {
        let name = match &patch.name {
            Some(n) => required_text("name", n)?,
            None => self.name.clone(),
        };
        let email = match &patch.email {
            Some(e) => Email::parse(e)?,
            None => self.email.clone(),
        };

        self.name = name;
        self.email = email;
        if patch.phone.is_some() {
            self.contact.phone = non_blank(patch.phone);
        }
        if patch.address.is_some() {
            self.contact.address = non_blank(patch.address);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::DomainError;

    fn sample() -> Customer {
        NewCustomer {
            name: "Ada Lovelace".into(),
            email: "ADA@example.com".into(),
            contact: ContactInfo {
                phone: Some("  ".into()),
                address: Some("12 Analytical Row".into()),
            },
        }
        .into_customer(CustomerId::new(), Utc::now())
        .unwrap()
    }

    #[test]
    fn new_customer_is_normalized() {
        let c = sample();
        assert_eq!(c.email.as_str(), "ada@example.com");
        assert_eq!(c.contact.phone, None);
        assert_eq!(c.contact.address.as_deref(), Some("12 Analytical Row"));
    }

    #[test]
    fn new_customer_requires_name_and_email() {
        let missing_name = NewCustomer {
            name: " ".into(),
            email: "a@b.c".into(),
            contact: ContactInfo::default(),
        };
        assert!(matches!(
            missing_name.into_customer(CustomerId::new(), Utc::now()),
            Err(DomainError::Validation(_))
        ));

        let bad_email = NewCustomer {
            name: "A".into(),
            email: "nope".into(),
            contact: ContactInfo::default(),
        };
        assert!(bad_email.into_customer(CustomerId::new(), Utc::now()).is_err());
    }

    #[test]
    fn failed_patch_leaves_record_untouched() {
        let mut c = sample();
        let before = c.clone();

        let err = c.apply(CustomerPatch {
            name: Some("New Name".into()),
            email: Some("broken".into()),
            ..CustomerPatch::default()
        });

        assert!(err.is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut c = sample();
        c.apply(CustomerPatch {
            phone: Some("555-0100".into()),
            ..CustomerPatch::default()
        })
        .unwrap();

        assert_eq!(c.name, "Ada Lovelace");
        assert_eq!(c.contact.phone.as_deref(), Some("555-0100"));
    }
}
