//! Customer entity and address value object.
//!
//! # Invariants
//! - A customer can only be active while it has an address.
//! - `reward_points` never decreases.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable customer identifier.
pub type CustomerId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    EmptyId,
    EmptyName,
    MissingAddressForActivation,
    InvalidAddress(&'static str),
    NegativeRewardPoints(i64),
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "customer id is required"),
            Self::EmptyName => write!(f, "customer name is required"),
            Self::MissingAddressForActivation => {
                write!(f, "address is mandatory to activate a customer")
            }
            Self::InvalidAddress(field) => write!(f, "address {field} is invalid"),
            Self::NegativeRewardPoints(points) => {
                write!(f, "reward points must not be negative, got {points}")
            }
        }
    }
}

impl Error for CustomerValidationError {}

/// Postal address value object. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: i64,
    pub zip: String,
    pub city: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        number: i64,
        zip: impl Into<String>,
        city: impl Into<String>,
    ) -> Result<Self, CustomerValidationError> {
        let address = Self {
            street: street.into(),
            number,
            zip: zip.into(),
            city: city.into(),
        };
        address.validate()?;
        Ok(address)
    }

    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.street.trim().is_empty() {
            return Err(CustomerValidationError::InvalidAddress("street"));
        }
        if self.number <= 0 {
            return Err(CustomerValidationError::InvalidAddress("number"));
        }
        if self.zip.trim().is_empty() {
            return Err(CustomerValidationError::InvalidAddress("zip"));
        }
        if self.city.trim().is_empty() {
            return Err(CustomerValidationError::InvalidAddress("city"));
        }
        Ok(())
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.street, self.number, self.zip, self.city
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub address: Option<Address>,
    pub active: bool,
    pub reward_points: i64,
}

impl Customer {
    /// Creates an inactive customer without address.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, CustomerValidationError> {
        let customer = Self {
            id: id.into(),
            name: name.into(),
            address: None,
            active: false,
            reward_points: 0,
        };
        customer.validate()?;
        Ok(customer)
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> Result<(), CustomerValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    pub fn change_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn activate(&mut self) -> Result<(), CustomerValidationError> {
        if self.address.is_none() {
            return Err(CustomerValidationError::MissingAddressForActivation);
        }
        self.active = true;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Adds reward points. Negative amounts are ignored.
    pub fn add_reward_points(&mut self, points: i64) {
        if points > 0 {
            self.reward_points = self.reward_points.saturating_add(points);
        }
    }

    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.id.trim().is_empty() {
            return Err(CustomerValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }
        if let Some(address) = &self.address {
            address.validate()?;
        }
        if self.active && self.address.is_none() {
            return Err(CustomerValidationError::MissingAddressForActivation);
        }
        if self.reward_points < 0 {
            return Err(CustomerValidationError::NegativeRewardPoints(
                self.reward_points,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Address, Customer, CustomerValidationError};

    #[test]
    fn activate_requires_address() {
        let mut customer = Customer::new("c1", "Customer 1").unwrap();
        assert_eq!(
            customer.activate().unwrap_err(),
            CustomerValidationError::MissingAddressForActivation
        );

        customer.change_address(Address::new("Street 1", 1, "Zipcode 1", "City 1").unwrap());
        customer.activate().unwrap();
        assert!(customer.active);
    }

    #[test]
    fn reward_points_only_grow() {
        let mut customer = Customer::new("c1", "Customer 1").unwrap();
        customer.add_reward_points(10);
        customer.add_reward_points(-5);
        assert_eq!(customer.reward_points, 10);
    }

    #[test]
    fn address_rejects_non_positive_number() {
        let err = Address::new("Street", 0, "Zip", "City").unwrap_err();
        assert_eq!(err, CustomerValidationError::InvalidAddress("number"));
    }
}
