use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoAppointmentDocument, MongoCounterDocument, MongoNoteDocument, MongoPatientDocument,
        MongoPhotoDocument, MongoUserDocument, MongoVitalDocument, doc_id,
    },
};
use crate::dao::{
    med_store::MedStore,
    models::{
        AppointmentEntity, MedicalNoteEntity, PatientEntity, PhotoEntity, RecordKind, UserEntity,
        VitalSignEntity,
    },
    storage::StorageResult,
};

const COUNTER_COLLECTION_NAME: &str = "counters";

/// Record kinds that hang off a patient and are removed with it.
const PATIENT_CHILDREN: [RecordKind; 4] = [
    RecordKind::Appointments,
    RecordKind::Notes,
    RecordKind::Vitals,
    RecordKind::Photos,
];

/// MongoDB-backed [`MedStore`] implementation.
#[derive(Clone)]
pub struct MongoMedStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMedStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let users = RecordKind::Users.collection();
        let email_index = IndexModel::builder()
            .keys(doc! {"email": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("user_email_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        database
            .collection::<Document>(users)
            .create_index(email_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: users,
                index: "email",
                source,
            })?;

        let patients = RecordKind::Patients.collection();
        let owner_index = IndexModel::builder()
            .keys(doc! {"user_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("patient_owner_idx".to_owned()))
                    .build(),
            )
            .build();
        database
            .collection::<Document>(patients)
            .create_index(owner_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: patients,
                index: "user_id",
                source,
            })?;

        for kind in PATIENT_CHILDREN {
            let collection = kind.collection();
            let index = IndexModel::builder()
                .keys(doc! {"patient_id": 1})
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_patient_idx")))
                        .build(),
                )
                .build();
            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: "patient_id",
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<D>(&self, kind: RecordKind) -> Collection<D>
    where
        D: Send + Sync,
    {
        let guard = self.inner.state.read().await;
        guard.database.collection::<D>(kind.collection())
    }

    async fn next_id(&self, kind: RecordKind) -> MongoResult<i64> {
        let name = kind.collection();
        let counters = {
            let guard = self.inner.state.read().await;
            guard
                .database
                .collection::<MongoCounterDocument>(COUNTER_COLLECTION_NAME)
        };

        let counter = counters
            .find_one_and_update(doc! {"_id": name}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId {
                collection: name,
                source,
            })?;

        // The upsert always yields a document when `ReturnDocument::After` is requested.
        Ok(counter.map_or(1, |counter| counter.seq))
    }

    async fn upsert<D>(&self, kind: RecordKind, id: i64, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(kind)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: kind.collection(),
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_by_id<D>(&self, kind: RecordKind, id: i64) -> MongoResult<Option<D>>
    where
        D: DeserializeOwned + Send + Sync,
    {
        self.collection::<D>(kind)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: kind.collection(),
                id,
                source,
            })
    }

    async fn find_many<D>(&self, kind: RecordKind, filter: Document) -> MongoResult<Vec<D>>
    where
        D: DeserializeOwned + Send + Sync + Unpin,
    {
        let collection = kind.collection();
        self.collection::<D>(kind)
            .await
            .find(filter)
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::List { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List { collection, source })
    }

    async fn delete_by_id(&self, kind: RecordKind, id: i64) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(kind)
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: kind.collection(),
                id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn create_user(&self, user: UserEntity) -> MongoResult<()> {
        let id = user.id;
        let collection = RecordKind::Users.collection();
        let document: MongoUserDocument = user.into();
        self.collection::<MongoUserDocument>(RecordKind::Users)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey { collection, source }
                } else {
                    MongoDaoError::Save {
                        collection,
                        id,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: String) -> MongoResult<Option<UserEntity>> {
        let collection = RecordKind::Users.collection();
        let document = self
            .collection::<MongoUserDocument>(RecordKind::Users)
            .await
            .find_one(doc! {"email": email})
            .await
            .map_err(|source| MongoDaoError::List { collection, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_patients(
        &self,
        user_id: i64,
        search: Option<String>,
    ) -> MongoResult<Vec<PatientEntity>> {
        let mut filter = doc! {"user_id": user_id};
        if let Some(term) = search {
            filter.insert(
                "name",
                doc! {"$regex": regex::escape(&term), "$options": "i"},
            );
        }

        let documents: Vec<MongoPatientDocument> =
            self.find_many(RecordKind::Patients, filter).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_patient(&self, id: i64) -> MongoResult<bool> {
        for kind in PATIENT_CHILDREN {
            self.collection::<Document>(kind)
                .await
                .delete_many(doc! {"patient_id": id})
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: kind.collection(),
                    id,
                    source,
                })?;
        }
        self.delete_by_id(RecordKind::Patients, id).await
    }

    async fn find_entity<D, E>(&self, kind: RecordKind, id: i64) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync + Into<E>,
    {
        Ok(self.find_by_id::<D>(kind, id).await?.map(Into::into))
    }

    async fn list_children<D, E>(&self, kind: RecordKind, patient_id: i64) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Send + Sync + Unpin + Into<E>,
    {
        let documents: Vec<D> = self
            .find_many(kind, doc! {"patient_id": patient_id})
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl MedStore for MongoMedStore {
    fn next_id(&self, kind: RecordKind) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move { store.next_id(kind).await.map_err(Into::into) })
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_user(user).await.map_err(Into::into) })
    }

    fn find_user(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoUserDocument, _>(RecordKind::Users, id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_by_email(email).await.map_err(Into::into) })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents: Vec<MongoUserDocument> =
                store.find_many(RecordKind::Users, doc! {}).await?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn save_patient(&self, patient: PatientEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = patient.id;
            let document: MongoPatientDocument = patient.into();
            store
                .upsert(RecordKind::Patients, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PatientEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoPatientDocument, _>(RecordKind::Patients, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_patients(
        &self,
        user_id: i64,
        search: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PatientEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_patients(user_id, search)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_patient(id).await.map_err(Into::into) })
    }

    fn save_appointment(
        &self,
        appointment: AppointmentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = appointment.id;
            let document: MongoAppointmentDocument = appointment.into();
            store
                .upsert(RecordKind::Appointments, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_appointment(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<AppointmentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoAppointmentDocument, _>(RecordKind::Appointments, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_appointments(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AppointmentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_children::<MongoAppointmentDocument, _>(RecordKind::Appointments, patient_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_appointment(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(RecordKind::Appointments, id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_note(&self, note: MedicalNoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = note.id;
            let document: MongoNoteDocument = note.into();
            store
                .upsert(RecordKind::Notes, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_note(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<MedicalNoteEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoNoteDocument, _>(RecordKind::Notes, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_notes(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<MedicalNoteEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_children::<MongoNoteDocument, _>(RecordKind::Notes, patient_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_note(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(RecordKind::Notes, id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_vital(&self, vital: VitalSignEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = vital.id;
            let document: MongoVitalDocument = vital.into();
            store
                .upsert(RecordKind::Vitals, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<VitalSignEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoVitalDocument, _>(RecordKind::Vitals, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_vitals(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<VitalSignEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_children::<MongoVitalDocument, _>(RecordKind::Vitals, patient_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(RecordKind::Vitals, id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_photo(&self, photo: PhotoEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = photo.id;
            let document: MongoPhotoDocument = photo.into();
            store
                .upsert(RecordKind::Photos, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PhotoEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_entity::<MongoPhotoDocument, _>(RecordKind::Photos, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_photos(&self, patient_id: i64) -> BoxFuture<'static, StorageResult<Vec<PhotoEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_children::<MongoPhotoDocument, _>(RecordKind::Photos, patient_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(RecordKind::Photos, id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
