use crate::{
    AnonymousRecord, Case, Error, FetchMode, FetchedRow, Field, NativeRow, NativeStatement,
    Nulls, Policies, Record, Result, RowLabeled, RowNames, Value,
};
use std::sync::PoisonError;

/// Column names folded according to `case`.
pub fn fold_case(labels: &RowNames, case: Case) -> RowNames {
    match case {
        Case::Natural => labels.clone(),
        _ => labels.iter().map(|v| case.fold(v)).collect(),
    }
}

/// Load every large object field.
pub fn load_lobs<S: NativeStatement>(fields: Vec<Field<S>>) -> Result<Vec<Field<S>>> {
    fields.into_iter().map(Field::loaded).collect()
}

/// Apply the null policy to one field. Large objects and cursors are never empty nor null.
pub fn normalize_nulls<S: NativeStatement>(field: Field<S>, nulls: Nulls) -> Field<S> {
    match (nulls, field) {
        (Nulls::NullToString, f) if f.is_null() => {
            Field::Value(Value::Varchar(Some(String::new())))
        }
        (Nulls::EmptyToNull, f) if f.is_empty() => Field::Value(Value::Null),
        (_, f) => f,
    }
}

/// Index of the field whose cursor replaces the whole row when flattening.
pub fn nested_index<S: NativeStatement>(mode: &FetchMode<S>) -> usize {
    mode.column().unwrap_or(0)
}

/// Takes the nested cursor out of `row` when the flattening slot holds one.
pub fn take_nested<S: NativeStatement>(
    row: &mut NativeRow<S>,
    mode: &FetchMode<S>,
) -> Option<S> {
    let index = nested_index(mode);
    if !row.fields.get(index).is_some_and(Field::is_cursor) {
        return None;
    }
    match std::mem::replace(&mut row.fields[index], Field::Value(Value::Null)) {
        Field::Cursor(cursor) => Some(cursor),
        _ => None,
    }
}

/// Shape a native row according to `mode`.
pub fn shape<S: NativeStatement>(
    row: NativeRow<S>,
    mode: &FetchMode<S>,
    policies: &Policies,
) -> Result<FetchedRow<S>> {
    let NativeRow { labels, fields } = row;
    Ok(match mode {
        FetchMode::Associative | FetchMode::Both => {
            let labels = fold_case(&labels, policies.case);
            let values = plain_fields(fields, policies)?.into_boxed_slice();
            let row = RowLabeled::new(labels, values);
            if matches!(mode, FetchMode::Associative) {
                FetchedRow::Associative(row)
            } else {
                FetchedRow::Both(row)
            }
        }
        FetchMode::Numeric | FetchMode::Positional => {
            FetchedRow::Numeric(plain_fields(fields, policies)?.into_boxed_slice())
        }
        FetchMode::Column(index) => FetchedRow::Column(column(fields, *index)?),
        FetchMode::Object { class, args } => {
            let mut record: Box<dyn Record<S>> = match class {
                Some(class) => class.construct(args)?,
                None => Box::new(AnonymousRecord::<S>::new()),
            };
            assign(record.as_mut(), &labels, fields, policies)?;
            FetchedRow::Object(record)
        }
        FetchMode::Into(target) => {
            {
                let mut guard = target.lock().unwrap_or_else(PoisonError::into_inner);
                assign(&mut *guard, &labels, fields, policies)?;
            }
            FetchedRow::Into(target.clone())
        }
    })
}

/// The field at `index` with its large object loaded, NULL when the row is too short.
pub fn column<S: NativeStatement>(fields: Vec<Field<S>>, index: usize) -> Result<Field<S>> {
    match fields.into_iter().nth(index) {
        Some(field) => field.loaded(),
        None => Ok(Field::Value(Value::Null)),
    }
}

fn plain_fields<S: NativeStatement>(
    fields: Vec<Field<S>>,
    policies: &Policies,
) -> Result<Vec<Field<S>>> {
    let fields = if policies.return_lobs {
        load_lobs(fields)?
    } else {
        fields
    };
    Ok(if policies.uniform_nulls {
        fields
            .into_iter()
            .map(|v| normalize_nulls(v, policies.nulls))
            .collect()
    } else {
        fields
    })
}

fn assign<S: NativeStatement>(
    record: &mut dyn Record<S>,
    labels: &RowNames,
    fields: Vec<Field<S>>,
    policies: &Policies,
) -> Result<()> {
    for (name, field) in labels.iter().zip(fields) {
        let name = policies.case.fold(name);
        let field = normalize_nulls(field, policies.nulls);
        let field = if policies.return_lobs {
            field.loaded()?
        } else {
            field
        };
        record.assign(&name, field).map_err(|e: Error| {
            e.context(format!("While assigning the column `{name}` to the fetched object"))
        })?;
    }
    Ok(())
}
