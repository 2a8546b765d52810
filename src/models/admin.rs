// src/models/admin.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::auth::{UserRole, UserStatus};

#[derive(Debug, Default, Clone, Serialize, PartialEq, ToSchema)]
pub struct UsersByRole {
    pub farmer: i64,
    pub expert: i64,
    pub admin: i64,
}

impl UsersByRole {
    // Monta a partir do GROUP BY role; papéis ausentes ficam com zero
    pub fn from_counts(counts: &[(UserRole, i64)]) -> Self {
        counts.iter().fold(Self::default(), |mut acc, (role, count)| {
            match role {
                UserRole::Farmer => acc.farmer += count,
                UserRole::Expert => acc.expert += count,
                UserRole::Admin => acc.admin += count,
            }
            acc
        })
    }

    pub fn total(&self) -> i64 {
        self.farmer + self.expert + self.admin
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub users_by_role: UsersByRole,
    pub total_diagnoses: i64,
    pub pending_queries: i64,
    pub total_categories: i64,
    pub total_products: i64,
    pub total_orders: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    pub status: UserStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_roles_count_as_zero() {
        let by_role = UsersByRole::from_counts(&[(UserRole::Farmer, 12), (UserRole::Admin, 1)]);
        assert_eq!(by_role, UsersByRole { farmer: 12, expert: 0, admin: 1 });
        assert_eq!(by_role.total(), 13);
    }

    #[test]
    fn stats_use_camel_case_keys() {
        let stats = AdminDashboardStats {
            total_users: 3,
            users_by_role: UsersByRole { farmer: 1, expert: 1, admin: 1 },
            total_diagnoses: 9,
            pending_queries: 2,
            total_categories: 5,
            total_products: 8,
            total_orders: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["usersByRole"]["expert"], 1);
        assert_eq!(json["pendingQueries"], 2);
    }
}
