/*!

This is the long-form manual for `circo_results` and `carte`.

## Results rows

A result row describes one candidate in one district. No fixed schema is assumed: the
datasets published for each election use their own column names. Every logical attribute
is looked up through an ordered list of acceptable field names (see [crate::FieldAliases]):

| attribute         | examples of field names                                |
|-------------------|--------------------------------------------------------|
| district code     | `CodeCirconscription`, `code_circo`                    |
| department        | `CodeDepartement`, `Code du département`               |
| district number   | `NumeroCirconscription`, `Code de la circonscription`  |
| bloc              | `Bloc`, `BlocPolitique`, `Bloc second tour`            |
| party / nuance    | `Nuance`, `Parti`, `LibelleNuance`                     |
| elected flag      | `Elu`, `EstElu`, `EluSecondTour`                       |
| score             | `Voix`, `NombreVoix`, `Pourcentage`, `Score%`          |
| identity          | `Prenom`, `Nom`, `NomCandidat`                         |

Empty strings and nulls count as missing.

### District codes

The canonical code is the department code followed by the district number, each padded to
two characters when numeric: department `5` and district `3` give `0503`, department `2A`
and district `1` give `2A01`. A direct code field is only trusted when it holds at least
four characters; otherwise the code is composed from the department and the number.
Rows without any code are skipped (aggregate or metadata rows).

### Winner

The first candidate with a truthy elected flag (`1`, `true`, `oui`, `yes`, `elu`) wins.
Otherwise the highest score wins, where scores such as `"12 345"` or `"45,2 %"` are
read in the French notation. Ties keep the first candidate.

### Bloc

The bloc field of the winner is classified first, then its party field. Short nuance codes
(`RN`, `LFI`, `ENS`) are looked up before full labels (`Ensemble !`,
`Rassemblement National`). A label that is not known is kept as its own bloc.

## Input formats

The following formats are supported by `carte`:
* `geojson`, `geojson_http` district boundaries as a GeoJSON feature collection
* `json` results as `{"data": [...]}` or as a bare list of rows
* `json_http` the same, paginated by the tabular API of data.gouv.fr
* `csv` results with a header row (`;` or `,` separated)
* `xlsx` results in an Excel workbook, first row as header

Several sources of the same kind are concatenated.

## Configuration

```json
{
  "outputSettings": { "title": "Législatives 2024" },
  "defaultEnvironment": "local",
  "environments": {
    "local": {
      "boundaries": [{ "provider": "geojson", "location": "circonscriptions.geojson" }],
      "results": [{ "provider": "csv", "location": "resultats.csv", "delimiter": ";" }]
    }
  },
  "blocs": [{ "name": "Rassemblement National", "color": "#4575b4", "label": "RN" }],
  "nuances": { "REC": "Rassemblement National" },
  "defaultBloc": "Divers",
  "maxPages": 50
}
```

Paths are relative to the configuration file.
*/
