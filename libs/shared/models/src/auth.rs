use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

/// Already-authenticated caller, handed to every scheduling operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

impl Actor {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            patient_id: None,
            doctor_id: None,
        }
    }

    pub fn patient(user_id: Uuid, patient_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Patient,
            patient_id: Some(patient_id),
            doctor_id: None,
        }
    }

    pub fn doctor(user_id: Uuid, doctor_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Doctor,
            patient_id: None,
            doctor_id: Some(doctor_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the actor is the patient with the given id.
    pub fn is_patient(&self, patient_id: Uuid) -> bool {
        self.role == Role::Patient && self.patient_id == Some(patient_id)
    }

    /// True when the actor is the doctor with the given id.
    pub fn is_doctor(&self, doctor_id: Uuid) -> bool {
        self.role == Role::Doctor && self.doctor_id == Some(doctor_id)
    }

    pub fn can_manage_doctor(&self, doctor_id: Uuid) -> bool {
        self.is_admin() || self.is_doctor(doctor_id)
    }
}
