use crate::models::Visibility;

/// The closed set of roles the party organisation recognises. Role strings in
/// the database that do not parse here (e.g. custom display roles added via
/// the role admin) carry no capability at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    AdminParty,
    Yantrik,
    Board,
    CentralCommittee,
    TeamMember,
    PartyMember,
    Member,
    Volunteer,
    Supporter,
    Guest,
}

/// Role a profile is stripped to when deactivated.
pub const LOWEST_PRIVILEGE_ROLE: &str = "guest";

impl Role {
    pub const BUILT_IN: [Role; 11] = [
        Role::Admin,
        Role::AdminParty,
        Role::Yantrik,
        Role::Board,
        Role::CentralCommittee,
        Role::TeamMember,
        Role::PartyMember,
        Role::Member,
        Role::Volunteer,
        Role::Supporter,
        Role::Guest,
    ];

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "admin_party" => Some(Role::AdminParty),
            "yantrik" => Some(Role::Yantrik),
            "board" => Some(Role::Board),
            "central_committee" => Some(Role::CentralCommittee),
            "team_member" => Some(Role::TeamMember),
            "party_member" => Some(Role::PartyMember),
            "member" => Some(Role::Member),
            "volunteer" => Some(Role::Volunteer),
            "supporter" => Some(Role::Supporter),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::AdminParty => "admin_party",
            Role::Yantrik => "yantrik",
            Role::Board => "board",
            Role::CentralCommittee => "central_committee",
            Role::TeamMember => "team_member",
            Role::PartyMember => "party_member",
            Role::Member => "member",
            Role::Volunteer => "volunteer",
            Role::Supporter => "supporter",
            Role::Guest => "guest",
        }
    }
}

// Each capability below is its own allow-list. The lists are intentionally
// NOT derived from one another or from a rank: central_committee may manage
// press releases but not CMS pages, board may review content but not delete
// it, and yantrik/board may manage users but not change roles.

pub fn can_manage_users(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(Role::Admin | Role::AdminParty | Role::Yantrik | Role::Board)
    )
}

pub fn can_review_content(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(Role::Admin | Role::Yantrik | Role::AdminParty | Role::Board)
    )
}

pub fn can_change_role(role: &str) -> bool {
    matches!(Role::parse(role), Some(Role::Admin | Role::AdminParty))
}

pub fn can_manage_cms(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(Role::Admin | Role::AdminParty | Role::Yantrik | Role::Board)
    )
}

pub fn can_manage_press_releases(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(
            Role::Admin
                | Role::AdminParty
                | Role::Yantrik
                | Role::Board
                | Role::CentralCommittee
        )
    )
}

pub fn can_manage_channels(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(Role::Admin | Role::AdminParty | Role::Yantrik | Role::Board | Role::TeamMember)
    )
}

pub fn can_delete_content(role: &str) -> bool {
    matches!(
        Role::parse(role),
        Some(Role::Admin | Role::AdminParty | Role::Yantrik)
    )
}

pub fn can_author_content(role: &str) -> bool {
    match Role::parse(role) {
        Some(Role::Supporter | Role::Guest) | None => false,
        Some(_) => true,
    }
}

/// Built-in roles may never be edited or deleted through the role admin,
/// regardless of who is asking.
pub fn is_system_role(name: &str) -> bool {
    Role::parse(name).is_some()
}

/// Whether a role may enter the management portal at all. Fine-grained checks
/// still run per action.
pub fn is_staff(role: &str) -> bool {
    can_manage_users(role)
        || can_manage_cms(role)
        || can_manage_press_releases(role)
        || can_manage_channels(role)
}

pub fn can_view_visibility(role: &str, visibility: Visibility) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Party => match Role::parse(role) {
            Some(Role::Supporter | Role::Guest) | None => false,
            Some(_) => true,
        },
        Visibility::Team => matches!(
            Role::parse(role),
            Some(
                Role::Admin
                    | Role::AdminParty
                    | Role::Yantrik
                    | Role::Board
                    | Role::CentralCommittee
                    | Role::TeamMember
            )
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [&str; 11] = [
        "admin",
        "admin_party",
        "yantrik",
        "board",
        "central_committee",
        "team_member",
        "party_member",
        "member",
        "volunteer",
        "supporter",
        "guest",
    ];

    #[test]
    fn review_capability_is_exactly_the_four_management_roles() {
        let reviewers = ["admin", "yantrik", "admin_party", "board"];
        for role in ALL_ROLES {
            assert_eq!(
                can_review_content(role),
                reviewers.contains(&role),
                "unexpected review capability for '{}'",
                role
            );
        }
    }

    #[test]
    fn change_role_is_narrower_than_manage_users() {
        for role in ALL_ROLES {
            let expected = role == "admin" || role == "admin_party";
            assert_eq!(can_change_role(role), expected, "role '{}'", role);
        }
        // yantrik and board manage users but may not change roles
        assert!(can_manage_users("yantrik") && !can_change_role("yantrik"));
        assert!(can_manage_users("board") && !can_change_role("board"));
    }

    #[test]
    fn central_committee_carve_outs() {
        assert!(!can_manage_cms("central_committee"));
        assert!(can_manage_press_releases("central_committee"));
    }

    #[test]
    fn board_reviews_but_cannot_delete() {
        assert!(can_review_content("board"));
        assert!(!can_delete_content("board"));
    }

    #[test]
    fn unknown_roles_have_no_capability() {
        for role in ["", "superuser", "ADMIN", "moderator", "admin "] {
            assert!(!can_manage_users(role));
            assert!(!can_review_content(role));
            assert!(!can_change_role(role));
            assert!(!can_manage_cms(role));
            assert!(!can_manage_press_releases(role));
            assert!(!can_manage_channels(role));
            assert!(!can_delete_content(role));
            assert!(!can_author_content(role));
            assert!(!is_staff(role));
            assert!(!can_view_visibility(role, Visibility::Party));
        }
    }

    #[test]
    fn every_built_in_role_is_a_system_role() {
        for role in ALL_ROLES {
            assert!(is_system_role(role), "'{}' should be protected", role);
        }
        assert!(!is_system_role("press_volunteer"));
    }

    #[test]
    fn visibility_axis() {
        assert!(can_view_visibility("guest", Visibility::Public));
        assert!(!can_view_visibility("guest", Visibility::Party));
        assert!(!can_view_visibility("supporter", Visibility::Party));
        assert!(can_view_visibility("member", Visibility::Party));
        assert!(!can_view_visibility("member", Visibility::Team));
        assert!(can_view_visibility("team_member", Visibility::Team));
        assert!(can_view_visibility("central_committee", Visibility::Team));
    }
}
