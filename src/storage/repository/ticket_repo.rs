use crate::domain::ticket::TicketUpdate;
use crate::domain::vocab::{Priority, RequestType, TicketStatus};
use crate::storage::entity::ticket::{
    self, ActiveModel as TicketActiveModel, Entity as Ticket, Model as TicketModel,
};
use crate::storage::repository::{AreaRepository, DepartmentRepository, TechnicianRepository};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Write model for a freshly submitted ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requester_name: String,
    pub requester_contact: Option<String>,
    pub department_id: i32,
    pub area_id: Option<i32>,
    pub request_type: RequestType,
    pub priority: Option<Priority>,
    pub before_photos: Vec<String>,
}

/// Typed ticket as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDto {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requester_name: String,
    pub requester_contact: Option<String>,
    pub department_id: i32,
    pub area_id: Option<i32>,
    pub request_type: RequestType,
    pub priority: Option<Priority>,
    pub status: TicketStatus,
    pub assigned_technician_id: Option<i32>,
    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    pub admin_notes: Option<String>,
    pub after_description: Option<String>,
    pub requester_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<TicketModel> for TicketDto {
    type Error = DbErr;

    fn try_from(model: TicketModel) -> Result<Self, Self::Error> {
        let request_type = model
            .request_type
            .parse::<RequestType>()
            .map_err(|e| DbErr::Type(format!("ticket {}: {}", model.id, e)))?;
        let status = model
            .status
            .parse::<TicketStatus>()
            .map_err(|e| DbErr::Type(format!("ticket {}: {}", model.id, e)))?;
        let priority = match model.priority.as_deref() {
            None | Some("") => None,
            Some(p) => Some(
                p.parse::<Priority>()
                    .map_err(|e| DbErr::Type(format!("ticket {}: {}", model.id, e)))?,
            ),
        };

        Ok(Self {
            request_type,
            status,
            priority,
            before_photos: serde_json::from_str(&model.before_photos).unwrap_or_default(),
            after_photos: serde_json::from_str(&model.after_photos).unwrap_or_default(),
            id: model.id,
            title: model.title,
            description: model.description,
            requester_name: model.requester_name,
            requester_contact: model.requester_contact,
            department_id: model.department_id,
            area_id: model.area_id,
            assigned_technician_id: model.assigned_technician_id,
            admin_notes: model.admin_notes,
            after_description: model.after_description,
            requester_notes: model.requester_notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Read model: the ticket plus the display names of what it references.
/// A name is `None` when the reference is empty or points at a deleted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub ticket: TicketDto,
    pub department_name: Option<String>,
    pub area_name: Option<String>,
    pub technician_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub search: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
}

const LIKE_ESCAPE: char = '!';

/// Escapes `LIKE` metacharacters so the needle only matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Plain substring match ignoring case. SQLite `LOWER()` only folds ASCII,
/// so the needle is folded the same way.
fn contains_ci(col: ticket::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_ascii_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

pub struct TicketRepository;

impl TicketRepository {
    pub async fn exists(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
        let n = Ticket::find()
            .filter(ticket::Column::Id.eq(id))
            .count(db)
            .await?;
        Ok(n > 0)
    }

    pub async fn insert(
        db: &DatabaseConnection,
        new: NewTicket,
        now: i64,
    ) -> Result<TicketModel, DbErr> {
        let before_photos =
            serde_json::to_string(&new.before_photos).unwrap_or_else(|_| "[]".to_string());
        let active_model = TicketActiveModel {
            id: Set(new.id),
            title: Set(new.title),
            description: Set(new.description),
            requester_name: Set(new.requester_name),
            requester_contact: Set(new.requester_contact),
            department_id: Set(new.department_id),
            area_id: Set(new.area_id),
            request_type: Set(new.request_type.as_str().to_string()),
            priority: Set(new.priority.map(|p| p.as_str().to_string())),
            status: Set(TicketStatus::Open.as_str().to_string()),
            assigned_technician_id: Set(None),
            before_photos: Set(before_photos),
            after_photos: Set("[]".to_string()),
            admin_notes: Set(None),
            after_description: Set(None),
            requester_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: &str,
    ) -> Result<Option<TicketDto>, DbErr> {
        match Ticket::find_by_id(id.to_string()).one(db).await? {
            Some(model) => Ok(Some(TicketDto::try_from(model)?)),
            None => Ok(None),
        }
    }

    pub async fn find_view(db: &DatabaseConnection, id: &str) -> Result<Option<TicketView>, DbErr> {
        match Ticket::find_by_id(id.to_string()).one(db).await? {
            Some(model) => Ok(Self::expand(db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Case-insensitive substring match on id OR title; first row in store
    /// order wins.
    pub async fn search_one(
        db: &DatabaseConnection,
        query: &str,
    ) -> Result<Option<TicketView>, DbErr> {
        let cond = Condition::any()
            .add(contains_ci(ticket::Column::Id, query))
            .add(contains_ci(ticket::Column::Title, query));
        match Ticket::find().filter(cond).one(db).await? {
            Some(model) => Ok(Self::expand(db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Newest first. `page_index` is zero based.
    pub async fn list_page(
        db: &DatabaseConnection,
        query: &TicketQuery,
        page_index: u64,
        page_size: u64,
    ) -> Result<(Vec<TicketView>, u64), DbErr> {
        let mut select = Ticket::find().order_by_desc(ticket::Column::CreatedAt);

        if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(contains_ci(ticket::Column::Title, needle))
                    .add(contains_ci(ticket::Column::Id, needle))
                    .add(contains_ci(ticket::Column::RequesterName, needle)),
            );
        }
        if let Some(status) = query.status {
            select = select.filter(ticket::Column::Status.eq(status.as_str()));
        }
        if let Some(priority) = query.priority {
            select = select.filter(ticket::Column::Priority.eq(priority.as_str()));
        }

        let paginator = select.paginate(db, page_size.max(1));
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page_index).await?;
        Ok((Self::expand(db, models).await?, total))
    }

    /// Single UPDATE statement; returns false when no row carries `id`.
    pub async fn apply_update(
        db: &DatabaseConnection,
        id: &str,
        update: &TicketUpdate,
        now: i64,
    ) -> Result<bool, DbErr> {
        let mut stmt = Ticket::update_many().col_expr(ticket::Column::UpdatedAt, Expr::value(now));

        if let Some(status) = update.status {
            stmt = stmt.col_expr(ticket::Column::Status, Expr::value(status.as_str()));
        }
        if let Some(technician) = update.technician {
            stmt = stmt.col_expr(ticket::Column::AssignedTechnicianId, Expr::value(technician));
        }
        if let Some(notes) = &update.admin_notes {
            stmt = stmt.col_expr(ticket::Column::AdminNotes, Expr::value(notes.clone()));
        }
        if let Some(text) = &update.after_description {
            stmt = stmt.col_expr(ticket::Column::AfterDescription, Expr::value(text.clone()));
        }
        if let Some(notes) = &update.requester_notes {
            stmt = stmt.col_expr(ticket::Column::RequesterNotes, Expr::value(notes.clone()));
        }

        let res = stmt.filter(ticket::Column::Id.eq(id)).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn set_after_photos(
        db: &DatabaseConnection,
        id: &str,
        photos: &[String],
        now: i64,
    ) -> Result<bool, DbErr> {
        let json = serde_json::to_string(photos).unwrap_or_else(|_| "[]".to_string());
        let res = Ticket::update_many()
            .col_expr(ticket::Column::AfterPhotos, Expr::value(json))
            .col_expr(ticket::Column::UpdatedAt, Expr::value(now))
            .filter(ticket::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn count(db: &DatabaseConnection) -> Result<u64, DbErr> {
        Ticket::find().count(db).await
    }

    pub async fn status_counts(db: &DatabaseConnection) -> Result<HashMap<String, u64>, DbErr> {
        let res = Ticket::find()
            .select_only()
            .column(ticket::Column::Status)
            .column_as(Expr::col(ticket::Column::Status).count(), "count")
            .group_by(ticket::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(db)
            .await?;

        Ok(res.into_iter().map(|(s, c)| (s, c as u64)).collect())
    }

    /// Tickets created in `[from, to)` (unix millis), oldest first.
    pub async fn created_between(
        db: &DatabaseConnection,
        from: Option<i64>,
        to: Option<i64>,
        department_id: Option<i32>,
    ) -> Result<Vec<TicketDto>, DbErr> {
        let mut select = Ticket::find().order_by_asc(ticket::Column::CreatedAt);
        if let Some(from) = from {
            select = select.filter(ticket::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to {
            select = select.filter(ticket::Column::CreatedAt.lt(to));
        }
        if let Some(dept) = department_id {
            select = select.filter(ticket::Column::DepartmentId.eq(dept));
        }
        select
            .all(db)
            .await?
            .into_iter()
            .map(TicketDto::try_from)
            .collect()
    }

    pub async fn closed(db: &DatabaseConnection) -> Result<Vec<TicketDto>, DbErr> {
        Ticket::find()
            .filter(ticket::Column::Status.eq(TicketStatus::Closed.as_str()))
            .all(db)
            .await?
            .into_iter()
            .map(TicketDto::try_from)
            .collect()
    }

    /// Attaches department/area/technician names to a batch of tickets.
    pub async fn expand(
        db: &DatabaseConnection,
        models: Vec<TicketModel>,
    ) -> Result<Vec<TicketView>, DbErr> {
        let dtos = models
            .into_iter()
            .map(TicketDto::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let dept_ids: HashSet<i32> = dtos.iter().map(|t| t.department_id).collect();
        let area_ids: HashSet<i32> = dtos.iter().filter_map(|t| t.area_id).collect();
        let tech_ids: HashSet<i32> = dtos.iter().filter_map(|t| t.assigned_technician_id).collect();

        let (departments, areas, technicians) = futures::try_join!(
            DepartmentRepository::names_by_ids(db, dept_ids.into_iter().collect()),
            AreaRepository::names_by_ids(db, area_ids.into_iter().collect()),
            TechnicianRepository::names_by_ids(db, tech_ids.into_iter().collect()),
        )?;

        Ok(dtos
            .into_iter()
            .map(|t| TicketView {
                department_name: departments.get(&t.department_id).cloned(),
                area_name: t.area_id.and_then(|id| areas.get(&id).cloned()),
                technician_name: t
                    .assigned_technician_id
                    .and_then(|id| technicians.get(&id).cloned()),
                ticket: t,
            })
            .collect())
    }
}
