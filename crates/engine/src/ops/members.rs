use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Member, ResultEngine, classifications,
    members::{self, hash_password, verify_password},
};

use super::{Engine, normalize_username, with_tx};

impl Engine {
    /// Add a member, hashing `password`.
    pub async fn add_member(&self, username: &str, password: &str) -> ResultEngine<Member> {
        if password.is_empty() {
            return Err(EngineError::MissingData);
        }
        let hash = hash_password(password)?;
        self.add_member_with_hash(username, &hash).await
    }

    /// Add a member whose password was hashed elsewhere (PHC string).
    pub async fn add_member_with_hash(&self, username: &str, hash: &str) -> ResultEngine<Member> {
        let username = normalize_username(username)?;

        if self.find_member(&username).await?.is_some() {
            return Err(EngineError::ExistingKey(username));
        }

        let model = members::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username),
            password: ActiveValue::Set(hash.to_string()),
        }
        .insert(&self.database)
        .await?;

        Ok(model.into())
    }

    /// Remove a member together with every verdict they submitted.
    pub async fn delete_member(&self, username: &str) -> ResultEngine<()> {
        let member = self.member(username).await?;

        with_tx!(self, |db_tx| {
            classifications::Entity::delete_many()
                .filter(classifications::Column::UserId.eq(member.id))
                .exec(&db_tx)
                .await?;
            members::Entity::delete_by_id(member.id).exec(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }

    pub async fn member(&self, username: &str) -> ResultEngine<Member> {
        self.find_member(username)
            .await?
            .map(Member::from)
            .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))
    }

    pub async fn members(&self) -> ResultEngine<Vec<Member>> {
        let models = members::Entity::find()
            .order_by_asc(members::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Member::from).collect())
    }

    /// Check credentials. `Ok(None)` means unknown user or wrong password.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> ResultEngine<Option<Member>> {
        let Some(model) = self.find_member(username).await? else {
            return Ok(None);
        };

        // argon2 is CPU bound; keep it off the async workers.
        let password = password.to_string();
        let hash = model.password.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|err| EngineError::PasswordHash(format!("verification task failed: {err}")))??;
        if verified {
            Ok(Some(model.into()))
        } else {
            Ok(None)
        }
    }

    async fn find_member(&self, username: &str) -> ResultEngine<Option<members::Model>> {
        Ok(members::Entity::find()
            .filter(members::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?)
    }
}
