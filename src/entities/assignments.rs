use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user. Set at creation, never reassigned.
    pub user_id: Uuid,

    pub name: String,

    /// 1..=10, enforced by the store layer.
    pub points: i32,

    /// 1..=100, enforced by the store layer.
    pub num_of_attempts: i32,

    /// RFC 3339 timestamp; parsed for deadline comparisons.
    pub deadline: String,

    pub assignment_created: String,

    pub assignment_updated: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
