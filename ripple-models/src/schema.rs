table! {
    accounts (id) {
        id -> Int4,
        email -> Varchar,
        hashed_password -> Text,
        is_staff -> Bool,
        is_superuser -> Bool,
        is_active -> Bool,
        creation_date -> Timestamp,
    }
}

table! {
    api_tokens (id) {
        id -> Int4,
        creation_date -> Timestamp,
        value -> Text,
        account_id -> Int4,
    }
}

table! {
    profiles (id) {
        id -> Int4,
        account_id -> Int4,
        first_name -> Varchar,
        last_name -> Varchar,
        city -> Varchar,
        country -> Varchar,
        age -> Nullable<Int4>,
        gender -> Nullable<Varchar>,
        bio -> Text,
        photo -> Nullable<Varchar>,
        registered_at -> Timestamp,
    }
}

table! {
    follows (id) {
        id -> Int4,
        follower_id -> Int4,
        following_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Varchar,
        content -> Text,
        hashtags -> Text,
        photo -> Nullable<Varchar>,
        creation_date -> Timestamp,
        author_id -> Int4,
    }
}

table! {
    comments (id) {
        id -> Int4,
        content -> Text,
        creation_date -> Timestamp,
        author_id -> Int4,
        post_id -> Int4,
    }
}

table! {
    likes (id) {
        id -> Int4,
        creation_date -> Timestamp,
        profile_id -> Int4,
        post_id -> Int4,
    }
}

joinable!(api_tokens -> accounts (account_id));
joinable!(profiles -> accounts (account_id));
joinable!(posts -> profiles (author_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> profiles (author_id));
joinable!(likes -> posts (post_id));
joinable!(likes -> profiles (profile_id));

allow_tables_to_appear_in_same_query!(
    accounts,
    api_tokens,
    profiles,
    follows,
    posts,
    comments,
    likes,
);
